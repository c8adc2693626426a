use std::fs::File;
use std::io::{BufRead, BufReader, IsTerminal};

use anyhow::{bail, Context};
use clap::Parser;

use k0s_version::upgrade;
use k0s_version::{Catalog, Collection, Constraint, Delta, DocsClient, GitHubTags, Version};

#[derive(Parser)]
#[command(name = "k0s_sort")]
#[command(about = "Sort, check and plan upgrades between k0s versions")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print k0s_sort version
    #[arg(short = 'v')]
    show_version: bool,

    /// Print only the latest version
    #[arg(short = 'l')]
    latest_only: bool,

    /// Omit prerelease versions
    #[arg(short = 's')]
    stable_only: bool,

    /// List released versions from GitHub (stable only)
    #[arg(short = 'a', conflicts_with = "list_all")]
    list_stable: bool,

    /// List released versions from GitHub including prereleases
    #[arg(short = 'A')]
    list_all: bool,

    /// Print the version delta instead of the upgrade path
    #[arg(short = 'd')]
    delta_only: bool,

    /// Require up-to-date online data instead of falling back to the cache
    #[arg(short = 'u')]
    require_fresh: bool,

    /// Filenames to read versions from (`-` for stdin), a constraint
    /// followed by versions to check, or an upgrade spec `FROM...TO`
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.show_version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.list_stable || cli.list_all {
        if cli.args.len() > 1 {
            bail!(
                "{} accepts at most one constraint argument",
                if cli.list_all { "-A" } else { "-a" }
            );
        }
        let constraint = match cli.args.first() {
            Some(arg) if !looks_like_constraint(arg) => {
                bail!("{arg:?} is not a valid constraint argument")
            }
            Some(arg) => {
                Some(Constraint::parse(arg).with_context(|| format!("parse constraint {arg:?}"))?)
            }
            None => None,
        };
        return print_catalog(
            cli.list_stable,
            cli.latest_only,
            constraint.as_ref(),
            cli.require_fresh,
        )
        .await;
    }

    if let Some(first) = cli.args.first() {
        if first.contains("...") {
            if cli.args.len() != 1 {
                bail!("upgrade path specification must be provided as a single argument");
            }
            return handle_upgrade_spec(first, cli.stable_only, cli.delta_only, cli.require_fresh)
                .await;
        }
    }

    if cli.delta_only {
        bail!("-d requires an upgrade path argument containing '...'");
    }

    if let Some(first) = cli.args.first() {
        if looks_like_constraint(first) {
            if cli.args.len() < 2 {
                bail!("constraint checks require at least one version argument");
            }
            let constraint =
                Constraint::parse(first).with_context(|| format!("parse constraint {first:?}"))?;
            for candidate in &cli.args[1..] {
                let version = Version::parse(candidate)
                    .with_context(|| format!("parse version {candidate:?}"))?;
                if !constraint.matches(&version) {
                    bail!("version {version} does not satisfy {constraint}");
                }
            }
            return Ok(());
        }
    }

    process_input(&cli.args, cli.stable_only, cli.latest_only)
}

fn default_catalog() -> anyhow::Result<Catalog> {
    let source = GitHubTags::new().context("create tag source")?;
    Catalog::new(Box::new(source)).context("locate version cache")
}

async fn load_versions(require_fresh: bool) -> anyhow::Result<Collection> {
    let outcome = default_catalog()?
        .load(require_fresh)
        .await
        .context("fetch versions")?;
    Ok(outcome.versions)
}

async fn print_catalog(
    stable_only: bool,
    latest_only: bool,
    constraint: Option<&Constraint>,
    require_fresh: bool,
) -> anyhow::Result<()> {
    let versions = load_versions(require_fresh).await?;

    let filtered: Vec<&Version> = versions
        .iter()
        .filter(|v| !stable_only || !v.is_prerelease())
        .filter(|v| constraint.map_or(true, |c| c.matches(v)))
        .collect();

    if latest_only {
        if let Some(last) = filtered.last() {
            println!("{last}");
        }
        return Ok(());
    }

    for version in filtered {
        println!("{version}");
    }
    Ok(())
}

fn process_input(files: &[String], stable_only: bool, latest_only: bool) -> anyhow::Result<()> {
    let mut collection = Collection::new();

    if files.is_empty() {
        if std::io::stdin().is_terminal() {
            bail!("stdin has no data; provide filenames or use -a/-A");
        }
        read_versions(std::io::stdin().lock(), stable_only, &mut collection)?;
    } else {
        for name in files {
            if name == "-" {
                read_versions(std::io::stdin().lock(), stable_only, &mut collection)?;
            } else {
                let file = File::open(name).with_context(|| format!("open {name}"))?;
                read_versions(BufReader::new(file), stable_only, &mut collection)
                    .with_context(|| format!("read {name}"))?;
            }
        }
    }

    collection.sort();

    if latest_only {
        if let Some(latest) = collection.last() {
            println!("{latest}");
        }
        return Ok(());
    }

    for version in &collection {
        println!("{version}");
    }
    Ok(())
}

fn read_versions(
    reader: impl BufRead,
    stable_only: bool,
    collection: &mut Collection,
) -> anyhow::Result<()> {
    for line in reader.lines() {
        let line = line.context("read input")?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let version =
            Version::parse(text).with_context(|| format!("parse version {text:?}"))?;
        if stable_only && version.is_prerelease() {
            continue;
        }
        collection.push(version);
    }
    Ok(())
}

async fn handle_upgrade_spec(
    spec: &str,
    stable_only: bool,
    delta_only: bool,
    require_fresh: bool,
) -> anyhow::Result<()> {
    let (from_raw, to_raw) = spec
        .split_once("...")
        .with_context(|| format!("invalid upgrade specification {spec:?}"))?;
    let from_raw = from_raw.trim();
    let to_raw = to_raw.trim();
    if from_raw.is_empty() {
        bail!("upgrade specification requires a starting version");
    }

    let from = Version::parse(from_raw).context("parse FROM version")?;
    let versions = load_versions(require_fresh).await?;

    let target = if to_raw.is_empty() {
        latest_with_docs_fallback(from.is_prerelease()).await?
    } else if to_raw.eq_ignore_ascii_case("stable") {
        latest_with_docs_fallback(false).await?
    } else if to_raw.eq_ignore_ascii_case("latest") {
        latest_with_docs_fallback(true).await?
    } else {
        Version::parse(to_raw).context("parse TO version")?
    };

    let target = versions.find_exact(&target).cloned().unwrap_or(target);

    if delta_only {
        println!("{}", Delta::new(&from, &target));
        return Ok(());
    }

    let target_canonical = target.to_string();
    let path = upgrade::plan(&from, &target, &versions)?;
    for version in &path {
        if stable_only && version.is_prerelease() && version.to_string() != target_canonical {
            continue;
        }
        println!("{version}");
    }
    Ok(())
}

/// Resolves `stable`/`latest` upgrade targets. Goes through the latest
/// resolver so a stale catalog is cross-checked against the docs reference.
async fn latest_with_docs_fallback(allow_prerelease: bool) -> anyhow::Result<Version> {
    let catalog = default_catalog()?;
    let docs = DocsClient::new().context("create docs client")?;
    k0s_version::latest::latest_by_prerelease(&catalog, &docs, allow_prerelease)
        .await
        .context("resolve latest version")
}

/// A leading `v`, `V` or digit means a version (or filename); anything else
/// is treated as a constraint expression.
fn looks_like_constraint(arg: &str) -> bool {
    match arg.trim().chars().next() {
        Some(first) => first != 'v' && first != 'V' && !first.is_ascii_digit(),
        None => false,
    }
}
