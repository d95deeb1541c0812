//! Command-line interface for notemig.

use std::path::PathBuf;

use clap::Parser;
use notemig_io_fs::SpecMigrateOptions;

use crate::conf::{C_FILE_CONF_DEFAULT, SpecMigrateConf};

/// Main CLI structure parsed by clap.
#[derive(Debug, Parser)]
#[command(name = "notemig")]
#[command(
    about = "Migrate an exported note tree, stripping identifiers and restoring created dates",
    long_about = None
)]
pub struct Cli {
    /// YAML file holding `import.path` and `export.path`
    #[arg(short, long, env = "NOTEMIG_CONFIG", default_value = C_FILE_CONF_DEFAULT)]
    pub config: PathBuf,

    /// Import root, overrides the config file
    #[arg(long)]
    pub import: Option<PathBuf>,

    /// Export root, overrides the config file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Worker threads for the copy stage (1 keeps the run sequential)
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Leave copied files with the current time instead of their `Created:` date
    #[arg(long)]
    pub no_created_date: bool,

    /// Log what would be migrated without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Combine the resolved config with run flags.
    pub fn to_options(&self, spec_conf: SpecMigrateConf) -> SpecMigrateOptions {
        SpecMigrateOptions {
            if_apply_created_date: !self.no_created_date,
            num_workers_max: Some(self.workers),
            if_dry_run: self.dry_run,
            ..SpecMigrateOptions::new(spec_conf.path_dir_import, spec_conf.path_dir_export)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Cli;
    use crate::conf::SpecMigrateConf;

    fn sample_conf() -> SpecMigrateConf {
        SpecMigrateConf::new(PathBuf::from("notes"), PathBuf::from("out")).expect("conf")
    }

    #[test]
    fn defaults_keep_sequential_dated_run() {
        let cli = Cli::try_parse_from(["notemig"]).expect("parse");
        assert!(!cli.dry_run);
        assert_eq!(cli.workers, 1);

        let spec_mg_options = cli.to_options(sample_conf());
        assert!(spec_mg_options.if_apply_created_date);
        assert!(!spec_mg_options.if_dry_run);
        assert_eq!(spec_mg_options.num_workers_max, Some(1));
        assert_eq!(spec_mg_options.path_dir_import, PathBuf::from("notes"));
        assert_eq!(spec_mg_options.path_dir_export, PathBuf::from("out"));
    }

    #[test]
    fn flags_map_onto_options() {
        let cli = Cli::try_parse_from([
            "notemig",
            "--config",
            "other.yaml",
            "--workers",
            "4",
            "--no-created-date",
            "--dry-run",
            "--export",
            "vault",
        ])
        .expect("parse");
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        assert_eq!(cli.export, Some(PathBuf::from("vault")));
        assert_eq!(cli.import, None);

        let spec_mg_options = cli.to_options(sample_conf());
        assert!(!spec_mg_options.if_apply_created_date);
        assert!(spec_mg_options.if_dry_run);
        assert_eq!(spec_mg_options.num_workers_max, Some(4));
    }
}
