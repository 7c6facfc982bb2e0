//! `cache` subcommand.

use anyhow::Result;

use crate::cache::now_ms;
use crate::cli::CacheAction;
use crate::config::ProjectConfig;
use crate::log;

pub fn run_cache(config: &ProjectConfig, action: CacheAction) -> Result<()> {
    let mut cache = config.cache.open_store();

    match action {
        CacheAction::List => {
            if cache.is_empty() {
                log!("cache"; "empty");
                return Ok(());
            }
            let now = now_ms();
            for (key, entry) in cache.entries() {
                println!(
                    "{:>6}m  {:>7} bytes  {}",
                    entry.age_ms(now) / 60_000,
                    entry.css.len(),
                    summarize_key(key)
                );
            }
            log!("cache"; "{} entries in {}", cache.len(), config.root_relative(&config.cache.dir).display());
        }
        CacheAction::Prune => {
            let removed = cache.evict_expired(config.cache.max_age());
            log!("cache"; "removed {} expired entries, {} left", removed, cache.len());
        }
        CacheAction::Clear => {
            let count = cache.len();
            cache.clear();
            log!("cache"; "removed {} entries", count);
        }
    }
    Ok(())
}

/// `a,b,c,...-hash` shortened to the first few classes.
fn summarize_key(key: &str) -> String {
    const SHOWN: usize = 4;
    let (classes, hash) = key.rsplit_once('-').unwrap_or((key, ""));
    let classes: Vec<&str> = classes.split(',').filter(|c| !c.is_empty()).collect();
    let mut out = classes.iter().take(SHOWN).copied().collect::<Vec<_>>().join(" ");
    if classes.len() > SHOWN {
        out.push_str(&format!(" (+{})", classes.len() - SHOWN));
    }
    format!("[{hash}] {out}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeHash;
    use tempfile::TempDir;

    #[test]
    fn test_summarize_key() {
        assert_eq!(summarize_key("a,b-0123"), "[0123] a b");
        assert_eq!(summarize_key("a,b,c,d,e,f-ff"), "[ff] a b c d (+2)");
    }

    #[test]
    fn test_prune_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::default();
        config.set_root(dir.path());
        config.normalize_paths();

        let hash = ThemeHash::compute("");
        let mut cache = config.cache.open_store();
        cache.save_at(&["p-4".to_string()], &hash, "a{}", 0);
        cache.save(&["m-2".to_string()], &hash, "b{}");

        run_cache(&config, CacheAction::Prune).unwrap();
        let cache = config.cache.open_store();
        assert_eq!(cache.len(), 1);

        run_cache(&config, CacheAction::List).unwrap();
        run_cache(&config, CacheAction::Clear).unwrap();
        let cache = config.cache.open_store();
        assert!(cache.is_empty());
    }
}
