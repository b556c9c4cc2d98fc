//! Weak-signal extraction: keyword scans of a job description against fixed
//! taxonomies. Pure and total: any input yields at least one signal.

/// One taxonomy entry: if any keyword occurs in the text, `message` is emitted.
struct SignalRule {
    keywords: &'static [&'static str],
    message: &'static str,
}

const fn rule(keywords: &'static [&'static str], message: &'static str) -> SignalRule {
    SignalRule { keywords, message }
}

const MATURITY_RULES: &[SignalRule] = &[
    rule(
        &["production", "scaling", "infrastructure"],
        "Mentions of production systems suggests operational ML maturity",
    ),
    rule(
        &["experimentation", "mlflow", "wandb", "neptune", "weights & biases"],
        "MLOps tooling mentioned indicates structured experimentation workflow",
    ),
    rule(
        &["ci/cd", "continuous integration", "deployment pipeline"],
        "CI/CD mentioned suggests automated ML deployment practices",
    ),
    rule(
        &["research", "paper", "publish", "arxiv"],
        "Research focus suggests academic/research-oriented ML team",
    ),
    rule(
        &["startup", "early stage", "founding"],
        "Early-stage company suggests building ML infrastructure from scratch",
    ),
    rule(
        &["enterprise", "fortune 500", "large scale"],
        "Enterprise context suggests complex legacy systems and scale challenges",
    ),
];

const INFRA_RULES: &[SignalRule] = &[
    rule(
        &["real-time", "streaming", "latency", "milliseconds"],
        "Real-time requirements suggest online inference infrastructure",
    ),
    rule(
        &["distributed", "kubernetes", "spark", "dask"],
        "Distributed systems mentioned indicates scale requirements",
    ),
    rule(
        &["aws", "gcp", "azure", "cloud"],
        "Cloud platform mentioned suggests cloud-native ML infrastructure",
    ),
    rule(
        &["terraform", "infrastructure as code", "iac"],
        "IaC tools suggest infrastructure automation and maturity",
    ),
    rule(
        &["docker", "containerization"],
        "Containerization suggests modern deployment practices",
    ),
    rule(
        &["microservices", "service-oriented"],
        "Microservices architecture suggests distributed ML systems",
    ),
];

const EVALUATION_RULES: &[SignalRule] = &[
    rule(
        &["evaluation", "monitoring", "observability", "ml monitoring"],
        "Focus on evaluation suggests production ML experience",
    ),
    rule(
        &["a/b testing", "experimentation", "ab test"],
        "A/B testing mentioned suggests data-driven decision making",
    ),
    rule(
        &["model drift", "data drift", "concept drift"],
        "Drift detection mentioned suggests mature ML monitoring",
    ),
    rule(
        &["grafana", "prometheus", "datadog", "new relic"],
        "Monitoring tools mentioned suggests operational visibility",
    ),
];

const DOMAIN_RULES: &[SignalRule] = &[
    rule(
        &["recommendation", "recommender"],
        "Recommendation systems suggest personalization/product ML",
    ),
    rule(
        &["nlp", "natural language", "llm", "transformer"],
        "NLP/LLM mentioned suggests language model work",
    ),
    rule(
        &["computer vision", "cv", "image", "video"],
        "Computer vision suggests perception ML problems",
    ),
    rule(
        &["fraud", "anomaly detection", "security"],
        "Fraud/anomaly detection suggests risk ML applications",
    ),
    rule(
        &["forecasting", "time series", "prediction"],
        "Forecasting suggests temporal modeling problems",
    ),
];

/// Scan order. Signals are emitted in taxonomy order, then entry order.
const TAXONOMIES: &[&[SignalRule]] = &[MATURITY_RULES, INFRA_RULES, EVALUATION_RULES, DOMAIN_RULES];

const TECH_KEYWORDS: &[&str] = &[
    "pytorch", "tensorflow", "keras", "jax", "scikit-learn",
    "kubernetes", "docker", "terraform", "aws", "gcp", "azure",
    "spark", "flink", "kafka", "redis", "postgres", "mongodb",
    "mlflow", "wandb", "kubeflow", "sagemaker", "vertex ai",
    "react", "node", "python", "java", "go", "rust",
    "graphql", "rest", "grpc",
];

const ML_FRAMEWORKS: &[&str] = &["pytorch", "tensorflow", "keras", "jax", "scikit-learn", "xgboost"];
const INFRA_TOOLS: &[&str] = &["kubernetes", "docker", "terraform", "spark", "kafka"];

pub const NO_SIGNALS_MESSAGE: &str =
    "Limited public signals found. Analysis based on job description patterns.";

/// Technology keywords occurring anywhere in the text, in keyword-list order.
/// Substring matching: "go" also matches "google".
pub fn extract_tech_stack(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TECH_KEYWORDS
        .iter()
        .copied()
        .filter(|tech| lower.contains(tech))
        .collect()
}

/// Collects weak signals about the hiring team's ML maturity, infrastructure,
/// evaluation practice and problem domain from a job description.
///
/// Duplicates across taxonomies are kept. Returns the single
/// [`NO_SIGNALS_MESSAGE`] when nothing matches.
pub fn collect_weak_signals(job_description: &str) -> Vec<String> {
    let text = job_description.to_lowercase();

    let mut signals: Vec<String> = TAXONOMIES
        .iter()
        .flat_map(|rules| rules.iter())
        .filter(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
        .map(|rule| rule.message.to_string())
        .collect();

    let tech_stack = extract_tech_stack(&text);
    let frameworks: Vec<&str> = tech_stack
        .iter()
        .copied()
        .filter(|t| ML_FRAMEWORKS.contains(t))
        .collect();
    let infra_tools: Vec<&str> = tech_stack
        .iter()
        .copied()
        .filter(|t| INFRA_TOOLS.contains(t))
        .collect();

    if !frameworks.is_empty() {
        signals.push(format!("ML frameworks mentioned: {}", frameworks.join(", ")));
    }
    if !infra_tools.is_empty() {
        signals.push(format!("Infrastructure tools: {}", infra_tools.join(", ")));
    }

    if signals.is_empty() {
        signals.push(NO_SIGNALS_MESSAGE.to_string());
    }
    signals
}
