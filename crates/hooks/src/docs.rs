// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-edit documentation enhancer.
//!
//! Scans the pending edit for library usage — dependency manifests, import
//! statements, framework fingerprints — and attaches current documentation
//! fetched from the documentation MCP server before the assistant writes
//! code. After a `Read` of a dependency manifest it reacts by fetching docs
//! for newly listed libraries. Every failure degrades silently to "no
//! enhancement"; this hook never vetoes.

use crate::hook::{base_config_schema, Hook, HookContext, HookError};
use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use warden_core::{Decision, EventType, HookEvent};
use warden_tools::{invoke, rpc};

const DOCS_TOOL: &str = "context7";
const EDIT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Libraries rendered into the message; the rest are only counted.
const MAX_RENDERED_SNIPPETS: usize = 2;

/// Libraries fetched on the reactive (post-Read) path.
const MAX_REACTIVE_LIBRARIES: usize = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub enabled: bool,
    pub proactive_enhancement: bool,
    pub max_tokens_per_library: u32,
    pub max_libraries: usize,
    pub cache_duration_hours: f64,
    pub priority_libraries: Vec<String>,
    pub resource_pool: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            proactive_enhancement: true,
            max_tokens_per_library: 8000,
            max_libraries: 3,
            cache_duration_hours: 24.0,
            priority_libraries: [
                "react",
                "next.js",
                "typescript",
                "react-query",
                "tailwindcss",
                "django",
                "fastapi",
                "nextauth.js",
                "prisma",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            resource_pool: "documentation".to_string(),
        }
    }
}

struct CacheEntry {
    content: String,
    acquired_at: u64,
}

pub struct DocsHook {
    config: DocsConfig,
    ctx: HookContext,
    detector: Detector,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl DocsHook {
    pub fn from_config(config: DocsConfig, ctx: HookContext) -> Self {
        Self {
            config,
            ctx,
            detector: Detector::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Candidate libraries from the event's content sources, prioritized
    /// and truncated to `max_libraries`.
    fn detect_libraries(&self, event: &HookEvent) -> Vec<String> {
        let mut detected: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let sources = [
            event.tool_input.content.as_deref(),
            event.tool_input.new_string.as_deref(),
            event.tool_input.file_path.as_deref(),
        ];
        for content in sources.into_iter().flatten() {
            if content.is_empty() {
                continue;
            }
            self.detector.scan(content, &mut detected, &mut seen);
        }

        self.prioritize(detected)
    }

    /// Configured priority libraries first, keeping detection order inside
    /// each group.
    fn prioritize(&self, detected: Vec<String>) -> Vec<String> {
        let (mut priority, rest): (Vec<String>, Vec<String>) = detected
            .into_iter()
            .partition(|lib| self.config.priority_libraries.contains(lib));
        priority.extend(rest);
        priority.truncate(self.config.max_libraries);
        priority
    }

    fn infer_topic(&self, event: &HookEvent) -> Option<String> {
        let content = event
            .tool_input
            .content
            .as_deref()
            .or(event.tool_input.new_string.as_deref())?
            .to_lowercase();
        topic_keywords()
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| content.contains(kw)))
            .map(|(topic, _)| topic.to_string())
    }

    fn cache_get(&self, key: &str) -> Option<String> {
        let cache = self.cache.lock();
        let entry = cache.get(key)?;
        let age = self
            .ctx
            .clock
            .now_epoch_secs()
            .saturating_sub(entry.acquired_at);
        let ttl = (self.config.cache_duration_hours * 3600.0) as u64;
        (age < ttl).then(|| entry.content.clone())
    }

    fn cache_put(&self, key: String, content: String) {
        self.cache.lock().insert(
            key,
            CacheEntry {
                content,
                acquired_at: self.ctx.clock.now_epoch_secs(),
            },
        );
    }

    /// Resolve → fetch → cache for one library. `None` means no
    /// enhancement for this library, for whatever reason.
    async fn enhance_library(&self, library: &str, topic: Option<&str>) -> Option<String> {
        let cache_key = format!("{library}:{}", topic.unwrap_or_default());
        if let Some(cached) = self.cache_get(&cache_key) {
            debug!(library, "documentation cache hit");
            return Some(cached);
        }

        let mut metadata = HashMap::new();
        metadata.insert("operation".to_string(), json!("docs_fetch"));
        metadata.insert("library".to_string(), json!(library));
        let permit = self
            .ctx
            .pool
            .acquire(
                &self.config.resource_pool,
                metadata,
                Some(self.ctx.timeouts.mcp_call),
            )
            .await;
        if !permit.acquired() {
            debug!(library, "documentation pool busy, skipping library");
            return None;
        }

        let library_id = self.resolve_library_id(library).await;
        let docs = self.fetch_library_docs(&library_id, topic).await?;
        self.cache_put(cache_key, docs.clone());
        Some(docs)
    }

    /// Ask the docs server for candidate ids and pick the best-scoring
    /// entry; falls back to the plain library name.
    async fn resolve_library_id(&self, library: &str) -> String {
        let Some(invocation) = self.ctx.tools.invocation(DOCS_TOOL) else {
            return library.to_string();
        };
        let request = rpc::tool_call("resolve-library-id", json!({"libraryName": library}), 1);
        match invoke(invocation, &request, self.ctx.timeouts.mcp_call).await {
            Ok(response) => rpc::first_content_text(&response)
                .and_then(|text| self.detector.select_best_match(text, library))
                .unwrap_or_else(|| library.to_string()),
            Err(e) => {
                warn!(library, error = %e, "library id resolution failed");
                library.to_string()
            }
        }
    }

    async fn fetch_library_docs(&self, library_id: &str, topic: Option<&str>) -> Option<String> {
        let invocation = self.ctx.tools.invocation(DOCS_TOOL)?;
        let mut arguments = json!({
            "context7CompatibleLibraryID": library_id,
            "tokens": self.config.max_tokens_per_library,
        });
        if let Some(topic) = topic {
            arguments["topic"] = json!(topic);
        }
        let request = rpc::tool_call("get-library-docs", arguments, 1);
        match invoke(invocation, &request, self.ctx.timeouts.mcp_call).await {
            Ok(response) => {
                let text = rpc::first_content_text(&response)?;
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!(library_id, error = %e, "documentation fetch failed");
                None
            }
        }
    }

    async fn proactive(&self, event: &HookEvent) -> Decision {
        let libraries = self.detect_libraries(event);
        if libraries.is_empty() {
            return Decision::silent();
        }
        debug!(?libraries, "detected libraries needing documentation");

        let topic = self.infer_topic(event);
        let mut enhancements = Vec::new();
        for library in &libraries {
            if let Some(docs) = self.enhance_library(library, topic.as_deref()).await {
                enhancements.push(docs);
            }
        }
        if enhancements.is_empty() {
            return Decision::silent();
        }
        Decision::allow(format_enhancements(&enhancements))
    }

    /// After a `Read` of a dependency manifest, fetch docs for what it
    /// lists.
    async fn reactive(&self, event: &HookEvent) -> Decision {
        let Some(file_path) = event.file_path() else {
            return Decision::silent();
        };
        let content = match tokio::fs::read_to_string(file_path).await {
            Ok(content) => content,
            Err(_) => return Decision::silent(),
        };

        let mut detected = Vec::new();
        let mut seen = HashSet::new();
        self.detector
            .scan_manifest(&content, &mut detected, &mut seen);

        let mut enhancements = Vec::new();
        for library in detected.iter().take(MAX_REACTIVE_LIBRARIES) {
            if let Some(docs) = self.enhance_library(library, None).await {
                enhancements.push(docs);
            }
        }
        if enhancements.is_empty() {
            return Decision::silent();
        }
        Decision::allow(format!(
            "📦 New dependencies detected:\n{}",
            format_enhancements(&enhancements)
        ))
    }
}

#[async_trait]
impl Hook for DocsHook {
    fn name(&self) -> &str {
        "context7_docs"
    }

    fn is_applicable(&self, event: &HookEvent) -> bool {
        if !self.config.enabled {
            return false;
        }
        match event.event_type {
            EventType::PreToolUse => EDIT_TOOLS.contains(&event.tool_name.as_str()),
            EventType::PostToolUse => {
                event.tool_name == "Read"
                    && event.file_path().is_some_and(is_dependency_manifest_path)
            }
        }
    }

    async fn process_event(&self, event: &HookEvent) -> Result<Decision, HookError> {
        if !self.is_applicable(event) {
            return Ok(Decision::silent());
        }
        if !self.ctx.tools.is_available(DOCS_TOOL) {
            debug!("documentation server not available, skipping enhancement");
            return Ok(Decision::silent());
        }
        let decision = match event.event_type {
            EventType::PreToolUse if self.config.proactive_enhancement => {
                self.proactive(event).await
            }
            EventType::PreToolUse => Decision::silent(),
            EventType::PostToolUse => self.reactive(event).await,
        };
        Ok(decision)
    }

    fn config_schema(&self) -> serde_json::Value {
        let mut schema = base_config_schema();
        if let Some(properties) = schema
            .get_mut("properties")
            .and_then(|p| p.as_object_mut())
        {
            properties.insert(
                "max_tokens_per_library".to_string(),
                json!({
                    "type": "integer",
                    "description": "Maximum tokens to fetch per library",
                    "default": 8000,
                    "minimum": 1000,
                    "maximum": 20000,
                }),
            );
            properties.insert(
                "max_libraries".to_string(),
                json!({
                    "type": "integer",
                    "description": "Maximum libraries enhanced per event",
                    "default": 3,
                    "minimum": 1,
                    "maximum": 10,
                }),
            );
            properties.insert(
                "cache_duration_hours".to_string(),
                json!({
                    "type": "number",
                    "description": "Hours to cache fetched documentation",
                    "default": 24,
                }),
            );
            properties.insert(
                "priority_libraries".to_string(),
                json!({
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Libraries fetched before all others",
                }),
            );
            properties.insert(
                "resource_pool".to_string(),
                json!({
                    "type": "string",
                    "description": "Concurrency pool name",
                    "default": "documentation",
                }),
            );
        }
        schema
    }

    async fn cleanup(&self) {
        self.cache.lock().clear();
    }
}

/// Compiled scanning machinery, built once per hook.
struct Detector {
    js_imports: Vec<Regex>,
    py_imports: Vec<Regex>,
    frameworks: Vec<(&'static str, Vec<Regex>)>,
    package_dep: Regex,
    requirement: Regex,
    entry_title: Regex,
    entry_trust: Regex,
    entry_id: Regex,
}

impl Detector {
    #[allow(clippy::expect_used)]
    fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("static regex");
        Self {
            js_imports: vec![
                compile(r#"import\s+.*?\s+from\s+["']([^"']+)["']"#),
                compile(r#"require\s*\(\s*["']([^"']+)["']\s*\)"#),
                compile(r#"import\s*\(\s*["']([^"']+)["']\s*\)"#),
            ],
            py_imports: vec![
                compile(r"from\s+([a-zA-Z][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)"),
                compile(r"import\s+([a-zA-Z][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)"),
            ],
            frameworks: framework_patterns()
                .into_iter()
                .map(|(name, patterns)| {
                    (name, patterns.into_iter().map(|p| compile(p)).collect())
                })
                .collect(),
            package_dep: compile(r#""([^"@]+)"\s*:"#),
            requirement: compile(r"(?m)^([a-zA-Z][a-zA-Z0-9\-_]*)"),
            entry_title: compile(r"Title: ([^\n]+)"),
            entry_trust: compile(r"Trust Score: ([\d.]+)"),
            entry_id: compile(r"Context7-compatible library ID: ([^\n]+)"),
        }
    }

    /// All three detection passes over one content source.
    fn scan(&self, content: &str, detected: &mut Vec<String>, seen: &mut HashSet<String>) {
        if is_dependency_content(content) {
            self.scan_manifest(content, detected, seen);
        }
        self.scan_imports(content, detected, seen);
        self.scan_frameworks(content, detected, seen);
    }

    fn scan_manifest(&self, content: &str, detected: &mut Vec<String>, seen: &mut HashSet<String>) {
        if content.contains("\"dependencies\":") || content.contains("\"devDependencies\":") {
            for capture in self.package_dep.captures_iter(content) {
                let lib = capture[1].to_string();
                if !lib.starts_with("@types/") {
                    push_unique(lib, detected, seen);
                }
            }
        }
        for capture in self.requirement.captures_iter(content) {
            let lib = capture[1].to_lowercase();
            if !matches!(lib.as_str(), "pip" | "setuptools" | "wheel") {
                push_unique(lib, detected, seen);
            }
        }
    }

    fn scan_imports(&self, content: &str, detected: &mut Vec<String>, seen: &mut HashSet<String>) {
        for pattern in &self.js_imports {
            for capture in pattern.captures_iter(content) {
                let lib = capture[1]
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                if !lib.is_empty() && !lib.starts_with('.') && !lib.starts_with("@types") {
                    push_unique(lib, detected, seen);
                }
            }
        }
        for pattern in &self.py_imports {
            for capture in pattern.captures_iter(content) {
                let lib = capture[1]
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                if !lib.is_empty() && !PYTHON_STDLIB.contains(&lib.as_str()) {
                    push_unique(lib, detected, seen);
                }
            }
        }
    }

    fn scan_frameworks(
        &self,
        content: &str,
        detected: &mut Vec<String>,
        seen: &mut HashSet<String>,
    ) {
        for (framework, patterns) in &self.frameworks {
            if patterns.iter().any(|p| p.is_match(content)) {
                push_unique(framework.to_string(), detected, seen);
            }
        }
    }

    /// Score resolver entries and return the id of the best match.
    ///
    /// Exact title match scores 100 + trust, prefix 80 + trust, substring
    /// 60 + trust, anything else just its trust score.
    fn select_best_match(&self, text: &str, library: &str) -> Option<String> {
        let needle = library.to_lowercase();
        let mut best_entry: Option<&str> = None;
        let mut best_score = 0.0_f64;

        for entry in text.split("----------") {
            if !entry.contains("Context7-compatible library ID:") {
                continue;
            }
            let title = self
                .entry_title
                .captures(entry)
                .map(|c| c[1].trim().to_lowercase())
                .unwrap_or_default();
            let trust = self
                .entry_trust
                .captures(entry)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(0.0);

            let score = if title == needle {
                100.0 + trust
            } else if title.starts_with(&needle) {
                80.0 + trust
            } else if title.contains(&needle) {
                60.0 + trust
            } else {
                trust
            };
            if score > best_score {
                best_score = score;
                best_entry = Some(entry);
            }
        }

        best_entry.and_then(|entry| {
            self.entry_id
                .captures(entry)
                .map(|c| c[1].trim().to_string())
        })
    }
}

fn push_unique(lib: String, detected: &mut Vec<String>, seen: &mut HashSet<String>) {
    if seen.insert(lib.clone()) {
        detected.push(lib);
    }
}

fn is_dependency_content(content: &str) -> bool {
    [
        "\"dependencies\":",
        "\"devDependencies\":",
        "install_requires",
        "requirements.txt",
        "[dependencies]",
        "Cargo.toml",
    ]
    .iter()
    .any(|marker| content.contains(marker))
}

fn is_dependency_manifest_path(file_path: &str) -> bool {
    [
        "package.json",
        "requirements.txt",
        "Cargo.toml",
        "pyproject.toml",
        "composer.json",
        "go.mod",
    ]
    .iter()
    .any(|manifest| file_path.contains(manifest))
}

fn framework_patterns() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("react", vec![r"useState", r"useEffect", r"React\."]),
        (
            "next.js",
            vec![
                r"next/",
                r"getStaticProps",
                r"getServerSideProps",
                r"NextApiRequest",
            ],
        ),
        ("django", vec![r"django\.", r"models\.Model", r"urls\.py"]),
        (
            "fastapi",
            vec![r"FastAPI", r"Depends\(", r"APIRouter"],
        ),
        ("flask", vec![r"Flask", r"@app\.route"]),
        ("express", vec![r"express", r"app\.get", r"app\.post"]),
        ("vue", vec![r"Vue\.", r"v-if", r"v-for", r"@click"]),
        (
            "angular",
            vec![r"@Component", r"@Injectable", r"ngOnInit"],
        ),
    ]
}

fn topic_keywords() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        (
            "authentication",
            &["auth", "login", "token", "session", "passport"],
        ),
        ("routing", &["route", "router", "endpoint", "api"]),
        ("testing", &["test", "spec", "mock", "jest", "pytest"]),
        (
            "hooks",
            &["usestate", "useeffect", "usecallback", "usememo"],
        ),
        ("components", &["component", "render", "props", "jsx", "tsx"]),
        ("database", &["query", "schema", "migration"]),
    ]
}

/// Python modules that never need external documentation.
const PYTHON_STDLIB: &[&str] = &[
    "abc", "argparse", "array", "ast", "asyncio", "base64", "bisect", "builtins", "collections",
    "concurrent", "configparser", "contextlib", "copy", "csv", "ctypes", "dataclasses", "datetime",
    "decimal", "enum", "errno", "fcntl", "fnmatch", "functools", "gc", "getopt", "glob", "gzip",
    "hashlib", "heapq", "hmac", "html", "http", "importlib", "inspect", "io", "ipaddress",
    "itertools", "json", "logging", "marshal", "math", "multiprocessing", "operator", "os",
    "pathlib", "pickle", "platform", "queue", "random", "re", "secrets", "select", "shlex",
    "shutil", "signal", "site", "socket", "sqlite3", "ssl", "statistics", "struct", "subprocess",
    "sys", "tarfile", "tempfile", "textwrap", "threading", "time", "timeit", "tkinter",
    "traceback", "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "venv",
    "warnings", "weakref", "xml", "zipfile", "zlib",
];

/// Render fetched documentation into the compact context block: per
/// snippet a title line, a description line, and a few code lines, with at
/// most two snippets shown.
fn format_enhancements(enhancements: &[String]) -> String {
    let mut parts = vec![
        "📚 Context7: current documentation context".to_string(),
        String::new(),
    ];

    for enhancement in enhancements.iter().take(MAX_RENDERED_SNIPPETS) {
        let snippet = Snippet::parse(enhancement);
        if snippet.title.is_empty() && snippet.description.is_empty() {
            continue;
        }
        parts.push(format!("🔸 **{}**", clip(&snippet.title, 60)));
        if !snippet.description.is_empty() {
            parts.push(format!("   {}", clip(&snippet.description, 100)));
        }
        if !snippet.code.is_empty() {
            parts.push(format!("   ```\n   {}\n   ```", clip(&snippet.code, 150)));
        }
        parts.push(String::new());
    }

    if enhancements.len() > MAX_RENDERED_SNIPPETS {
        parts.push(format!(
            "... and {} more documentation entries available",
            enhancements.len() - MAX_RENDERED_SNIPPETS
        ));
    }
    parts.push("💡 Full documentation available for enhanced code completion".to_string());
    parts.join("\n")
}

struct Snippet {
    title: String,
    description: String,
    code: String,
}

impl Snippet {
    /// Pull TITLE/DESCRIPTION and the first code block out of a raw
    /// documentation blob.
    fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut title = String::new();
        let mut description = String::new();
        let mut code = String::new();

        for (index, line) in lines.iter().take(20).enumerate() {
            if let Some(rest) = line.strip_prefix("TITLE:") {
                title = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("DESCRIPTION:") {
                description = rest.trim().to_string();
            } else if line.starts_with("CODE:") && code.is_empty() {
                let mut code_lines = Vec::new();
                for code_line in lines.iter().skip(index + 1).take(5) {
                    if code_line.starts_with("```") {
                        if !code_lines.is_empty() {
                            break;
                        }
                    } else if !code_line.trim().is_empty() {
                        code_lines.push(*code_line);
                    }
                }
                code = code_lines.join("\n");
                break;
            }
        }

        Self {
            title,
            description,
            code,
        }
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(max_chars).collect();
        clipped.push_str("...");
        clipped
    }
}

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
