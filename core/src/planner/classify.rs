use lazy_static::lazy_static;
use regex::Regex;

use super::types::PlanRequest;

/// How a request is turned into a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStrategy {
    /// Run shell commands one after another.
    CommandChain { commands: Vec<String> },
    /// Check a script exists, then run it with the interpreter its extension implies.
    RunScript { script: String },
    /// Create a new project for a known ecosystem.
    Scaffold {
        ecosystem: Ecosystem,
        name: Option<String>,
    },
    /// Open-ended request, handed to the synthesis capability.
    Decompose,
}

impl PlanStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CommandChain { .. } => "command-chain",
            Self::RunScript { .. } => "run-script",
            Self::Scaffold { .. } => "scaffold",
            Self::Decompose => "decompose",
        }
    }

    pub fn is_template(&self) -> bool {
        !matches!(self, Self::Decompose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Rust,
    Node,
    Python,
    Go,
    React,
}

impl Ecosystem {
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "rust" | "cargo" => Some(Self::Rust),
            "node" | "nodejs" | "node.js" | "npm" | "javascript" | "js" => Some(Self::Node),
            "python" | "py" => Some(Self::Python),
            "go" | "golang" => Some(Self::Go),
            "react" | "vite" => Some(Self::React),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Node => "node",
            Self::Python => "python",
            Self::Go => "go",
            Self::React => "react",
        }
    }
}

lazy_static! {
    static ref BACKTICKED: Regex = Regex::new(r"`([^`\n]+)`").expect("valid regex");
    static ref CHAIN_WORD: Regex =
        Regex::new(r"(?i)`\s*(?:,|;|&&|\band\b|\bthen\b|\band then\b)\s*(?:run\s+)?`")
            .expect("valid regex");
    static ref LEADING_VERB: Regex =
        Regex::new(r"(?i)^\s*(?:please\s+)?(?:run|execute|exec)\s*:?\s+").expect("valid regex");
    static ref RUN_SCRIPT: Regex = Regex::new(
        r"(?i)\b(?:run|execute|launch|start)\s+(?:the\s+)?(?:script\s+)?`?((?:\./|[\w.-]+/)*[\w.-]+\.(?:sh|bash|py|js|mjs|ts|rb|pl|ps1))\b`?"
    )
    .expect("valid regex");
    static ref SCAFFOLD: Regex = Regex::new(
        r"(?i)\b(?:scaffold|bootstrap|create|set\s*up|init(?:ialize)?|generate|start)\b(?:\s+(?:a|an|new|the|my|fresh|basic|simple|empty))*\s+(?:(\w[\w.]*)\s+)?(?:project|app|application|crate|package|repo)\b(?:\s+(?:called|named)\s+`?([\w.-]+)`?|\s+`?(\w[\w.-]*)`?)?"
    )
    .expect("valid regex");
}

/// Pick a generation strategy for `request`.
///
/// Template strategies win only when exactly one template family matches;
/// everything else, including ambiguous requests, is decomposed.
pub fn classify(request: &PlanRequest) -> PlanStrategy {
    let query = request.query.trim();
    if query.is_empty() {
        return PlanStrategy::Decompose;
    }

    let mut matches = Vec::new();
    if let Some(commands) = match_command_chain(query) {
        matches.push(PlanStrategy::CommandChain { commands });
    }
    if let Some(script) = match_run_script(query) {
        matches.push(PlanStrategy::RunScript { script });
    }
    if let Some((ecosystem, name)) = match_scaffold(query, request.project_hint.as_deref()) {
        matches.push(PlanStrategy::Scaffold { ecosystem, name });
    }

    if matches.len() == 1 {
        matches.remove(0)
    } else {
        if matches.len() > 1 {
            tracing::debug!(
                candidates = ?matches.iter().map(PlanStrategy::name).collect::<Vec<_>>(),
                "request matches several templates, decomposing instead"
            );
        }
        PlanStrategy::Decompose
    }
}

fn match_command_chain(query: &str) -> Option<Vec<String>> {
    let quoted: Vec<String> = BACKTICKED
        .captures_iter(query)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if quoted.len() >= 2 && CHAIN_WORD.is_match(query) {
        return Some(quoted);
    }

    // A bare shell line such as `cargo fmt && cargo test`.
    if !quoted.is_empty() || query.contains('\n') || !query.contains("&&") {
        return None;
    }
    let body = LEADING_VERB.replace(query, "");
    let commands: Vec<String> = body
        .split("&&")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (commands.len() >= 2).then_some(commands)
}

fn match_run_script(query: &str) -> Option<String> {
    RUN_SCRIPT
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn match_scaffold(query: &str, project_hint: Option<&str>) -> Option<(Ecosystem, Option<String>)> {
    let caps = SCAFFOLD.captures(query)?;
    let ecosystem = caps
        .get(1)
        .and_then(|m| Ecosystem::parse(m.as_str()))
        .or_else(|| project_hint.and_then(Ecosystem::parse))?;
    let name = caps
        .get(2)
        .or_else(|| caps.get(3).filter(|m| !is_connective(m.as_str())))
        .map(|m| m.as_str().to_string());
    Some((ecosystem, name))
}

/// Words that continue the sentence after the project noun rather than name it.
fn is_connective(word: &str) -> bool {
    const WORDS: &[&str] = &[
        "and", "with", "for", "using", "that", "which", "in", "into", "to", "on", "from",
        "then", "so", "where", "under", "inside", "at", "of", "here", "there", "now",
    ];
    WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}
