//! Resolve content codes against a catalog snapshot.
//!
//! Usage: resolve_snapshot <snapshot.json> <code>...
//!
//! Cache settings come from the `CATYPE_CACHE_*` environment variables and
//! log verbosity from `RUST_LOG`.

use std::process::ExitCode;
use std::sync::Arc;

use catype_storage::{
    CacheConfig, CachedContentTypeResolver, CatalogContentTypeResolver, CatypeResult,
    ContentTypeDescriptor, ContentTypeResolver, InMemoryCacheStore, SnapshotCatalog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((snapshot_path, codes)) = args.split_first() else {
        eprintln!("Usage: resolve_snapshot <snapshot.json> <code>...");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  resolve_snapshot catalog.json shirts shirt-1");
        return ExitCode::FAILURE;
    };

    match run(snapshot_path, codes) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(snapshot_path: &str, codes: &[String]) -> CatypeResult<()> {
    let snapshot = Arc::new(SnapshotCatalog::load(snapshot_path)?);

    let resolver = CatalogContentTypeResolver::new(
        snapshot.clone(),
        snapshot.clone(),
        snapshot.as_ref(),
    )?;
    let store = Arc::new(InMemoryCacheStore::<ContentTypeDescriptor>::new());
    let cached =
        CachedContentTypeResolver::new(resolver, snapshot.clone(), store, CacheConfig::from_env())?;

    let resolved = cached.resolve_content_types_by_code(codes)?;

    for code in codes {
        let Some(object) = snapshot.object_by_code(code) else {
            println!("{code} -> (unknown code)");
            continue;
        };
        let content_link = object.content_link();
        match resolved.iter().find(|r| r.content_link == content_link) {
            Some(r) => println!("{code} -> {}", r.content_type),
            None => println!("{code} -> (unresolved)"),
        }
    }

    Ok(())
}
