use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::resolve::RepositorySession;
use crate::utils::resolve_against;

pub struct AppContext {
    /// Directory holding the project descriptor.
    pub project_dir: PathBuf,
    pub descriptor_path: PathBuf,
    pub config: Config,
    pub session: RepositorySession,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::build(&cwd, &cli.project, cli.config.as_deref(), cli.robot)
    }

    fn build(
        cwd: &Path,
        project: &Path,
        config_path: Option<&Path>,
        robot_mode: bool,
    ) -> Result<Self> {
        let descriptor_path = resolve_against(cwd, project);
        let project_dir = descriptor_path
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        let config = Config::load(config_path, &project_dir)?;
        let session = RepositorySession::new(config.local_repository());

        Ok(Self {
            project_dir,
            descriptor_path,
            config,
            session,
            robot_mode,
        })
    }
}
