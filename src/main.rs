use anyhow::{anyhow, Result};
use clap::Parser;
use etcsnap::backup::{backup_etc, BackupContext};
use etcsnap::cache::RunCache;
use etcsnap::cli::RootArgs;
use etcsnap::history::HistoryResolver;
use etcsnap::pacman::{load_local_packages, PacmanConf, SyncDb};
use etcsnap::pkglist::backup_pkglist;
use etcsnap::report::AuditReport;
use etcsnap::status::PathStatus;
use etcsnap::sysroot::SysRoot;
use etcsnap::walk::IgnoreFilter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let root = SysRoot::new(&args.root);
    let conf = PacmanConf::load(&root.host_path(&args.config))?;
    let db_path = root.host_path(&conf.db_path);
    let packages = load_local_packages(&db_path)?;
    tracing::info!(packages = packages.len(), db = %db_path.display(), "loaded local database");

    let selection = args.selection();
    if selection.etc {
        cmd_etc(&args, &root, &conf, &packages)?;
    }
    if selection.pkglist {
        backup_pkglist(&args.output, &packages)?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_etc(
    args: &RootArgs,
    root: &SysRoot,
    conf: &PacmanConf,
    packages: &[etcsnap::pacman::Package],
) -> Result<()> {
    let db_path = root.host_path(&conf.db_path);
    let sync_dbs: Vec<SyncDb> = conf
        .repos
        .iter()
        .filter_map(|repo| match SyncDb::load(&db_path, repo) {
            Ok(db) => Some(db),
            Err(err) => {
                tracing::warn!(repo = %repo, "skipping sync database: {err:#}");
                None
            }
        })
        .collect();
    let cache_dirs: Vec<PathBuf> = conf
        .cache_dirs
        .iter()
        .map(|dir| root.host_path(dir))
        .collect();
    let ignore = IgnoreFilter::from_dir(&args.output)?;
    let scan_dir = args.scan_dir();

    let ctx = BackupContext {
        root,
        output_dir: &args.output,
        scan_dir: &scan_dir,
        packages,
        history: HistoryResolver::new(&sync_dbs, &cache_dirs),
        ignore: &ignore,
    };
    let mut cache = RunCache::new();
    let (classification, summary) = backup_etc(&ctx, &mut cache)?;

    tracing::info!(
        owned = classification.count(PathStatus::Owned),
        unchanged = classification.count(PathStatus::BackupUnchanged),
        unknown = classification.count(PathStatus::BackupUnknown),
        untracked = summary.untracked,
        modified = summary.modified,
        diffs = summary.diffs_written,
        archives = cache.cached_archives(),
        "etc backup finished"
    );

    if let Some(report_path) = &args.report {
        AuditReport::new(&classification, &summary).write(report_path)?;
        println!("Wrote report to {}", report_path.display());
    }
    if summary.failures > 0 {
        return Err(anyhow!(
            "{} path(s) could not be backed up; see warnings above",
            summary.failures
        ));
    }
    Ok(())
}
