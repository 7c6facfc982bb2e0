//! The compiler context.
//!
//! One long-lived [`Compiler`] owns every piece of state: the scanner, the
//! theme, the rule generator and its memo, the cache, the live stylesheet
//! and the debouncer. It is constructed once, driven by [`Compiler::init`]
//! and [`Compiler::handle_event`], and torn down with [`Compiler::teardown`].
//!
//! ```text
//! events ─► scanner (incremental) ─► debouncer ─► compile
//!                                                  ├─ generator (new classes only)
//!                                                  ├─ live stylesheet ─► css file / <head>
//!                                                  └─ cache save
//! ```

mod debouncer;
mod events;
mod output;
mod sources;

pub use debouncer::Debouncer;
pub use events::CompilerEvent;
pub use output::{CRITICAL_STYLE_ID, LiveStylesheet, UTILITY_STYLE_ID, is_utility_sheet_last, minify_css};
pub use sources::{Component, FsSources, MemorySources, SourceProvider};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::cache::CacheStore;
use crate::config::ProjectConfig;
use crate::generate::{Rule, RuleGenerator, render};
use crate::scan::{ClassFilter, ClassScanner, MutationRules, Selector, SelectorError};
use crate::theme::{Theme, ThemeHash, style_blocks};
use crate::{debug, log};

/// Where compiled CSS is written.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub css: PathBuf,
    pub minify: bool,
    /// HTML file that receives the `<style>` elements.
    pub inject: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub root_selector: String,
    pub theme_selector: String,
    pub debounce: Duration,
    pub min_interval: Duration,
    pub max_cache_age: Duration,
    pub class_filter: ClassFilter,
    pub mutation_rules: MutationRules,
    pub output: Option<OutputTarget>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::from_config(&ProjectConfig::default())
    }
}

impl CompilerOptions {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            root_selector: config.compiler.root_selector.clone(),
            theme_selector: config.compiler.theme_selector.clone(),
            debounce: config.compiler.debounce(),
            min_interval: config.compiler.min_interval(),
            max_cache_age: config.cache.max_age(),
            class_filter: config.scan.class_filter(),
            mutation_rules: config.scan.mutation_rules(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = Some(output);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Idle,
    Compiling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled {
        classes: usize,
        rules: usize,
        /// Rules generated by this compile (memo misses).
        generated: usize,
        /// The utility sheet content changed.
        changed: bool,
    },
    /// A compile was already running; the request was recorded instead.
    Skipped,
    /// The minimum interval has not elapsed; the request was scheduled.
    Deferred,
}

pub struct Compiler {
    sources: Box<dyn SourceProvider>,
    options: CompilerOptions,
    scanner: ClassScanner,
    theme: Theme,
    generator: RuleGenerator,
    cache: Option<CacheStore>,
    sheet: LiveStylesheet,
    debouncer: Debouncer,
    /// class → generated rule (`None` for classes that are not utilities).
    memo: FxHashMap<String, Option<Rule>>,
    memo_theme: ThemeHash,
    /// Components delivered through events, by name.
    loaded_components: FxHashMap<String, String>,
    state: CompileState,
    compiles: u64,
}

impl Compiler {
    pub fn new(
        sources: impl SourceProvider + 'static,
        options: CompilerOptions,
        cache: Option<CacheStore>,
    ) -> Self {
        let theme = Theme::default();
        Self {
            sources: Box::new(sources),
            scanner: ClassScanner::new(options.class_filter.clone()),
            generator: RuleGenerator::new(&theme),
            memo_theme: theme.hash().clone(),
            theme,
            cache,
            sheet: LiveStylesheet::new(),
            debouncer: Debouncer::new(options.debounce, options.min_interval),
            memo: FxHashMap::default(),
            loaded_components: FxHashMap::default(),
            state: CompileState::Idle,
            compiles: 0,
            options,
        }
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn state(&self) -> CompileState {
        self.state
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn scanner(&self) -> &ClassScanner {
        &self.scanner
    }

    /// Degraded mode: no host-library class detection.
    pub fn set_host_detection(&mut self, enabled: bool) {
        self.scanner.set_host_detection(enabled);
    }

    pub fn stylesheet(&self) -> &LiveStylesheet {
        &self.sheet
    }

    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn compile_count(&self) -> u64 {
        self.compiles
    }

    // ========================================================================
    // runtime registration
    // ========================================================================

    pub fn add_ignored_class_pattern(&mut self, pattern: &str) {
        self.scanner.filter_mut().add_pattern(pattern);
        self.options.class_filter.add_pattern(pattern);
    }

    pub fn add_ignored_element_selector(&mut self, selector: &str) -> Result<(), SelectorError> {
        let selector = Selector::parse(selector)?;
        self.options.mutation_rules.ignored_elements.push(selector);
        Ok(())
    }

    pub fn add_significant_change_selector(&mut self, selector: &str) -> Result<(), SelectorError> {
        let selector = Selector::parse(selector)?;
        self.options.mutation_rules.significant.push(selector);
        Ok(())
    }

    // ========================================================================
    // lifecycle
    // ========================================================================

    /// Initial load: theme, critical styles, cache hit, full compile.
    pub fn init(&mut self) -> CompileOutcome {
        let started = Instant::now();
        self.reload_theme();
        self.refresh_static();

        let classes = self.scanner.used_classes();
        let critical = self.render_uncached(&classes);
        debug!("compile"; "critical sheet: {} bytes", critical.len());
        self.sheet.set_critical(critical);

        self.apply_cached(&classes);

        self.generator.enable_full();
        let outcome = self.compile("initial load");
        self.sheet.clear_critical();
        // Outputs written while the critical sheet was live must not keep it
        self.write_outputs();

        debug!("compile"; "init finished in {:?}", started.elapsed());
        outcome
    }

    /// Drop pending work and return to idle.
    pub fn teardown(&mut self) {
        self.debouncer.clear();
        self.state = CompileState::Idle;
        debug!("compile"; "teardown after {} compiles", self.compiles);
    }

    /// Apply the best cached sheet for `classes` before the real compile.
    fn apply_cached(&mut self, classes: &[String]) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        cache.evict_expired(self.options.max_cache_age);
        let Some(entry) = cache.load_best(classes, self.theme.hash()) else {
            return;
        };
        debug!("cache"; "applying cached css ({} bytes)", entry.css.len());
        if self.sheet.set(entry.css.clone()) {
            self.write_outputs();
        }
    }

    // ========================================================================
    // events
    // ========================================================================

    /// Feed one event. Returns whether a recompile is now pending.
    pub fn handle_event(&mut self, event: CompilerEvent) -> bool {
        let reason = event.label();
        match event {
            CompilerEvent::ComponentLoaded { name, html } => {
                let fresh = self.scanner.scan_fragment(&html);
                let has_theme = !style_blocks(&html).is_empty();
                debug!("scan"; "component {}: {} new classes", name, fresh.len());
                self.loaded_components.insert(name, html);
                if has_theme && self.reload_theme() {
                    self.schedule("theme-changed");
                }
                if !fresh.is_empty() {
                    self.schedule(reason);
                }
            }
            CompilerEvent::ComponentsProcessed | CompilerEvent::ComponentsReady => {
                self.scanner.invalidate_components();
                self.schedule(reason);
            }
            CompilerEvent::RouteChange { path } => {
                debug!("scan"; "route change to {}", path);
                self.scanner.invalidate_components();
                self.schedule(reason);
            }
            CompilerEvent::Mutations { mutations } => {
                let scan = self
                    .scanner
                    .scan_dynamic(&mutations, &self.options.mutation_rules);
                if scan.significant {
                    self.scanner.invalidate_components();
                }
                if scan.should_recompile() {
                    debug!("scan"; "{} new classes from {} mutations", scan.new_classes.len(), mutations.len());
                    self.schedule(reason);
                }
            }
            CompilerEvent::Trigger { reason } => {
                self.trigger_recompilation(&reason);
            }
            CompilerEvent::ThemeChanged => {
                if self.reload_theme() {
                    self.schedule(reason);
                }
            }
        }
        self.debouncer.is_pending()
    }

    fn schedule(&mut self, reason: &str) {
        self.debouncer.record(reason);
    }

    /// Compile now unless the minimum interval since the last compile has
    /// not elapsed, in which case the compile is scheduled.
    pub fn trigger_recompilation(&mut self, reason: &str) -> CompileOutcome {
        if !self.debouncer.interval_elapsed() {
            self.schedule(reason);
            return CompileOutcome::Deferred;
        }
        self.compile(reason)
    }

    /// Run the pending compile if the debounce window has closed.
    pub fn poll(&mut self) -> Option<CompileOutcome> {
        let reasons = self.debouncer.take_if_ready()?;
        Some(self.compile(&reasons.join(", ")))
    }

    /// Time until [`Compiler::poll`] may have work.
    pub fn sleep_duration(&self) -> Duration {
        self.debouncer.sleep_duration()
    }

    // ========================================================================
    // compilation
    // ========================================================================

    /// Compile the current class set.
    ///
    /// `Idle → Compiling → Idle` on every path; a request arriving while a
    /// compile runs is recorded in the debouncer instead.
    pub fn compile(&mut self, reason: &str) -> CompileOutcome {
        if self.state == CompileState::Compiling {
            self.schedule(reason);
            return CompileOutcome::Skipped;
        }

        self.state = CompileState::Compiling;
        let outcome = self.run_compile(reason);
        self.state = CompileState::Idle;
        outcome
    }

    fn run_compile(&mut self, reason: &str) -> CompileOutcome {
        self.debouncer.mark_compiled();
        self.compiles += 1;
        self.refresh_static();

        if self.theme.hash() != &self.memo_theme {
            debug!("compile"; "theme changed, dropping {} memoized rules", self.memo.len());
            self.memo.clear();
            self.memo_theme = self.theme.hash().clone();
        }

        let classes = self.scanner.used_classes();
        let mut generated = 0;
        for class in &classes {
            if !self.memo.contains_key(class) {
                let rule = self.generator.generate(class, &self.theme);
                generated += usize::from(rule.is_some());
                self.memo.insert(class.clone(), rule);
            }
        }

        let rules: Vec<&Rule> = classes
            .iter()
            .filter_map(|c| self.memo.get(c).and_then(Option::as_ref))
            .collect();
        let rule_count = rules.len();
        let css = render(rules);
        let changed = self.sheet.set(css);

        if changed {
            self.write_outputs();
        }
        if let Some(cache) = self.cache.as_mut()
            && !classes.is_empty()
        {
            cache.save(&classes, self.theme.hash(), self.sheet.css());
            cache.evict_expired(self.options.max_cache_age);
        }

        debug!("compile"; "{}: {} classes, {} rules ({} new)", reason, classes.len(), rule_count, generated);
        CompileOutcome::Compiled {
            classes: classes.len(),
            rules: rule_count,
            generated,
            changed,
        }
    }

    /// Render `classes` with the generator as-is, bypassing the memo.
    fn render_uncached(&self, classes: &[String]) -> String {
        let rules: Vec<Rule> = classes
            .iter()
            .filter_map(|c| self.generator.generate(c, &self.theme))
            .collect();
        render(&rules)
    }

    fn write_outputs(&self) {
        let Some(output) = &self.options.output else {
            return;
        };
        if let Err(e) = self.sheet.write(&output.css, output.minify) {
            log!("error"; "failed to write {}: {}", output.css.display(), e);
        }
        if let Some(html) = &output.inject
            && let Err(e) = self.sheet.inject_file(html)
        {
            log!("error"; "failed to inject into {}: {}", html.display(), e);
        }
    }

    // ========================================================================
    // inputs
    // ========================================================================

    /// Rebuild the static class set if components were invalidated.
    fn refresh_static(&mut self) {
        if !self.scanner.needs_static_scan() {
            return;
        }
        let page = self.sources.page_html().unwrap_or_default();
        let mut components: Vec<String> = self
            .sources
            .components()
            .into_iter()
            .map(|c| c.html)
            .collect();
        components.extend(self.loaded_components.values().cloned());
        self.scanner.scan_static(&page, &components);
    }

    /// Re-read theme sources. Returns whether the theme hash changed.
    pub fn reload_theme(&mut self) -> bool {
        let mut texts = self.sources.theme_css();
        if let Some(page) = self.sources.page_html() {
            texts.extend(style_blocks(&page).into_iter().map(String::from));
        }
        for component in self.sources.components() {
            texts.extend(style_blocks(&component.html).into_iter().map(String::from));
        }
        for html in self.loaded_components.values() {
            texts.extend(style_blocks(html).into_iter().map(String::from));
        }

        let theme = Theme::parse(
            &texts,
            &self.options.root_selector,
            &self.options.theme_selector,
        );
        if theme.hash() == self.theme.hash() {
            return false;
        }
        debug!("compile"; "theme {}: {} variables", theme.hash(), theme.len());
        self.generator.set_theme(&theme);
        self.theme = theme;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::scan::{ElementSnapshot, Mutation};
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><head><style>:root { --color-primary: #ff0000; }</style></head>
<body><div class="color-primary-bg totally-unknown-xyz"></div></body></html>"#;

    fn compiler(sources: MemorySources) -> Compiler {
        Compiler::new(sources, CompilerOptions::default(), Some(CacheStore::in_memory()))
    }

    fn class_mutation(class: &str) -> CompilerEvent {
        CompilerEvent::Mutations {
            mutations: vec![Mutation::Attributes {
                attribute: "class".into(),
                target: ElementSnapshot::new("div").with_class(class),
                ancestors: vec![],
            }],
        }
    }

    /// Pretend the debounce window and minimum interval have passed.
    fn expire_timers(c: &mut Compiler) {
        let past = Instant::now() - Duration::from_secs(1);
        c.debouncer.last_event = c.debouncer.last_event.map(|_| past);
        c.debouncer.last_compile = Some(past);
    }

    #[test]
    fn test_init_end_to_end() {
        let mut c = compiler(MemorySources::new(PAGE));
        let outcome = c.init();

        assert!(matches!(outcome, CompileOutcome::Compiled { rules: 1, .. }));
        assert_eq!(
            c.stylesheet().css(),
            ".color-primary-bg { background-color: #ff0000; }\n"
        );
        assert!(c.stylesheet().critical().is_none());
        assert_eq!(c.state(), CompileState::Idle);
        assert_eq!(c.cache().unwrap().len(), 1);
    }

    #[test]
    fn test_init_applies_cache_before_compile() {
        let mut cache = CacheStore::in_memory();
        let theme = Theme::parse(&[":root { --color-primary: #ff0000; }"], ":root", "@theme");
        cache.save(
            &["color-primary-bg".to_string()],
            theme.hash(),
            ".color-primary-bg { background-color: #ff0000; }\n",
        );
        let mut c = Compiler::new(MemorySources::new(PAGE), CompilerOptions::default(), Some(cache));
        let outcome = c.init();
        // Cached CSS already matched, so the compile left the sheet unchanged
        assert!(matches!(outcome, CompileOutcome::Compiled { changed: false, .. }));
    }

    #[test]
    fn test_mutation_burst_coalesces() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();

        for class in ["p-4", "p-8", "m-2"] {
            assert!(c.handle_event(class_mutation(class)));
        }
        assert!(c.poll().is_none(), "debounce window still open");

        expire_timers(&mut c);
        let outcome = c.poll().unwrap();
        assert!(matches!(outcome, CompileOutcome::Compiled { generated: 3, .. }));
        assert!(c.poll().is_none());
        assert_eq!(c.compile_count(), 2);
        assert!(c.stylesheet().css().contains(".m-2 { margin: calc(0.25rem * 2); }"));
    }

    #[test]
    fn test_known_class_does_not_retrigger() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        assert!(!c.handle_event(class_mutation("color-primary-bg")));
    }

    #[test]
    fn test_ignored_attribute_never_triggers() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        let event = CompilerEvent::Mutations {
            mutations: vec![Mutation::Attributes {
                attribute: "aria-hidden".into(),
                target: ElementSnapshot::new("div").with_class("brand-new-class"),
                ancestors: vec![],
            }],
        };
        assert!(!c.handle_event(event));
    }

    #[test]
    fn test_trigger_respects_min_interval() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        assert_eq!(c.trigger_recompilation("manual"), CompileOutcome::Deferred);
        assert!(c.debouncer().is_pending());

        expire_timers(&mut c);
        assert!(matches!(
            c.trigger_recompilation("manual"),
            CompileOutcome::Compiled { .. }
        ));
    }

    #[test]
    fn test_compile_while_compiling_is_skipped() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.state = CompileState::Compiling;
        assert_eq!(c.compile("re-entrant"), CompileOutcome::Skipped);
        assert!(c.debouncer().is_pending());
        c.state = CompileState::Idle;
        assert!(matches!(c.compile("next"), CompileOutcome::Compiled { .. }));
        assert_eq!(c.state(), CompileState::Idle);
    }

    #[test]
    fn test_component_loaded_adds_classes() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        let event = CompilerEvent::ComponentLoaded {
            name: "card".into(),
            html: r#"<article class="rounded-full"></article>"#.into(),
        };
        assert!(c.handle_event(event));
        expire_timers(&mut c);
        c.poll();
        assert!(c.stylesheet().css().contains("border-radius: 9999px"));

        // Survives a later full static rescan
        c.handle_event(CompilerEvent::ComponentsProcessed);
        expire_timers(&mut c);
        c.poll();
        assert!(c.stylesheet().css().contains("border-radius: 9999px"));
    }

    #[test]
    fn test_theme_change_regenerates() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        let event = CompilerEvent::ComponentLoaded {
            name: "theme".into(),
            html: "<style>:root { --color-primary: #00ff00; }</style>".into(),
        };
        assert!(c.handle_event(event));
        expire_timers(&mut c);
        c.poll();
        assert!(c.stylesheet().css().contains("#00ff00"));
    }

    #[test]
    fn test_runtime_registration() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        c.add_ignored_class_pattern("^brand-");
        assert!(!c.handle_event(class_mutation("brand-logo")));

        c.add_ignored_element_selector("[data-skip]").unwrap();
        let event = CompilerEvent::Mutations {
            mutations: vec![Mutation::ChildList {
                target: ElementSnapshot::new("div").with_attrs([("data-skip", "")]),
                ancestors: vec![],
                added: vec![ElementSnapshot::new("span").with_class("p-4")],
            }],
        };
        assert!(!c.handle_event(event));

        assert!(c.add_significant_change_selector("div > p").is_err());
    }

    #[test]
    fn test_teardown_drops_pending() {
        let mut c = compiler(MemorySources::new(PAGE));
        c.init();
        c.handle_event(class_mutation("p-4"));
        c.teardown();
        assert!(!c.debouncer().is_pending());
        assert_eq!(c.state(), CompileState::Idle);
    }

    #[test]
    fn test_writes_output_file() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("utilities.css");
        let html = dir.path().join("index.html");
        fs::write(&html, PAGE).unwrap();

        let options = CompilerOptions::default().with_output(OutputTarget {
            css: css.clone(),
            minify: false,
            inject: Some(html.clone()),
        });
        let mut c = Compiler::new(MemorySources::new(PAGE), options, None);
        c.init();

        assert!(fs::read_to_string(&css).unwrap().contains(".color-primary-bg"));
        assert!(is_utility_sheet_last(&fs::read_to_string(&html).unwrap()));
    }

    fn injecting_options(dir: &TempDir) -> (CompilerOptions, PathBuf) {
        let html = dir.path().join("index.html");
        fs::write(&html, PAGE).unwrap();
        let options = CompilerOptions::default().with_output(OutputTarget {
            css: dir.path().join("utilities.css"),
            minify: false,
            inject: Some(html.clone()),
        });
        (options, html)
    }

    #[test]
    fn test_init_leaves_no_critical_sheet_in_page() {
        let dir = TempDir::new().unwrap();
        let (options, html) = injecting_options(&dir);
        let mut c = Compiler::new(MemorySources::new(PAGE), options, Some(CacheStore::in_memory()));
        c.init();

        let page = fs::read_to_string(&html).unwrap();
        assert!(!page.contains(CRITICAL_STYLE_ID));
        assert!(page.contains(".color-primary-bg"));
        assert!(is_utility_sheet_last(&page));
    }

    #[test]
    fn test_init_cache_hit_leaves_no_critical_sheet_in_page() {
        let dir = TempDir::new().unwrap();
        let (options, html) = injecting_options(&dir);
        let mut cache = CacheStore::in_memory();
        let theme = Theme::parse(&[":root { --color-primary: #ff0000; }"], ":root", "@theme");
        cache.save(
            &["color-primary-bg".to_string()],
            theme.hash(),
            ".color-primary-bg { background-color: #ff0000; }\n",
        );
        let mut c = Compiler::new(MemorySources::new(PAGE), options, Some(cache));
        let outcome = c.init();

        // The compile found nothing new, yet the page must still drop the critical sheet
        assert!(matches!(outcome, CompileOutcome::Compiled { changed: false, .. }));
        let page = fs::read_to_string(&html).unwrap();
        assert!(!page.contains(CRITICAL_STYLE_ID));
        assert!(is_utility_sheet_last(&page));
    }

    #[test]
    fn test_set_host_detection() {
        let page = r#"<div :class="{ 'p-4': open }"></div>"#;
        let mut c = compiler(MemorySources::new(page));
        c.set_host_detection(false);
        c.init();
        assert!(c.stylesheet().css().is_empty());
    }
}
