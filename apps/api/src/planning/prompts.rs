// All LLM prompt constants for the Planning module.
// Reuses cross-cutting fragments from llm_client::prompts.
//
// Slots are filled with llm_client::prompts::fill. User-supplied values
// (company name, job description, page text) are always filled last.

/// System prompt for context inference.
pub const INFERENCE_SYSTEM: &str =
    "You are an expert ML engineer analyzing companies for ML maturity. Respond only with valid JSON.";

/// Context inference prompt. Replace `{weak_signals}`, `{company_name}` and
/// `{job_description}` (already truncated) before sending.
pub const INFERENCE_PROMPT_TEMPLATE: &str = r#"Based on the following information about {company_name}, analyze their ML maturity level, infrastructure complexity, and likely challenges:

Company: {company_name}
Job Description: {job_description}...
Weak Signals Found: {weak_signals}

Provide a brief analysis of:
1. ML Maturity Level (Early/Intermediate/Advanced)
2. Infrastructure Complexity (Low/Medium/Medium-High/High)
3. Likely Challenges

Format as JSON with keys: mlMaturity, infraComplexity, likelyChallenges"#;

/// Plan generator system prompt. Replace `{cv}`, `{first_name}`,
/// `{previous_employer_context}` and `{candidate_name}` before sending.
pub const PLAN_SYSTEM_TEMPLATE: &str = r#"{cv}

You are {candidate_name} creating a strategic 90-day plan. You have the complete CV above with all experiences, skills, and projects.

IMPORTANT CONTEXT:
- {first_name} has experience in mentoring (as Consulting Director at Data Science Student Society, he led selection processes, oversaw project execution, and provided technical + strategic support to students)
- {first_name} has experience in AI development and agent development (built AI-driven code-generation frameworks, worked with LLMs, RAG systems, prompt engineering, and agent-like systems at BILL and SEELab)
{previous_employer_context}
CRITICAL: Every single item in your plan MUST reference a specific experience, project, or skill from the CV. Find creative connections - even if the domain is different, explain how the methodology, skills, or learnings apply. Use phrases like "Building on my experience at BILL where I..." or "Leveraging my work at SEELab where I...". Write in first person."#;

/// Bullet added to the system prompt when the company is a previous employer.
/// Replace `{first_name}` and `{company_name}`.
pub const PREVIOUS_EMPLOYER_CONTEXT: &str = "- {first_name} has previously worked at {company_name}, so he understands their policies, culture, systems, and workflows. Reference this when relevant.\n";

/// Paragraph added to the plan prompt when the company is a previous employer.
/// Replace `{first_name}` and `{company_name}`.
pub const PREVIOUS_EMPLOYER_NOTE: &str = "\nIMPORTANT: {first_name} has previously worked at {company_name}. In your plan, acknowledge this prior experience and mention that he understands the company's policies, culture, systems, and workflows due to his prior work there. Reference specific systems or projects he worked on at {company_name} when relevant.";

/// Plan generator prompt. Replace `{candidate_name}`, `{first_name}`,
/// `{previous_employer_note}`, `{company_name}` and `{job_description}`.
pub const PLAN_PROMPT_TEMPLATE: &str = r###"You are creating a strategic 90-day plan for {candidate_name} joining {company_name}.
{previous_employer_note}

STEP 1 - COMPANY RESEARCH (USE YOUR KNOWLEDGE):
Using your training data and knowledge, research {company_name}:
- What does {company_name} do? What is their business model?
- What products or services do they offer?
- What is their technology stack? (if known)
- What are typical ML use cases in their industry?
- What challenges do companies like {company_name} typically face?
- What is their scale? (startup, mid-size, enterprise?)
- What is their ML maturity level? (Early/Intermediate/Advanced)
- What is their infrastructure complexity? (Low/Medium/High)
- Reference specific details about {company_name} in your plan

STEP 2 - JOB DESCRIPTION ANALYSIS:
Analyze the following job description thoroughly:
{job_description}

From this job description, identify:
- Key technical requirements and skills needed
- ML/engineering challenges mentioned or implied
- Infrastructure and deployment needs
- Team structure and collaboration requirements
- Business objectives and success metrics

YOUR TASK:
First, provide a brief research summary with 3-5 bullet points about {company_name} and the inferred team/context based on the job description. Then create a strategic 90-day plan.

OUTPUT FORMAT:
1. Start with "## Research & Context" section with 3-5 bullet points covering:
   - Company business model, products, or key characteristics
   - Inferred team structure, size, or ML maturity based on job description
   - Technology stack or infrastructure hints from the job description
   - Key challenges or opportunities specific to this role/company

2. Then provide "## First 90 Days Plan" with sections for Days 1-30, Days 31-60, and Days 61-90.

3. For EACH item in the plan, use this structured format:
   **Title:** [Brief, action-oriented title]
   **Objective:** [What this accomplishes and why it matters]
   **Experience:** [Include in MOST items (about 70%): Specific, detailed reference to {first_name}'s past experience/skills that directly connects to the action]
   **Action:** [Specific steps or approach to achieve the objective, clearly connected to the experience mentioned]

CRITICAL: Experience references must be SPECIFIC and DETAILED:
- Don't just say "I worked on LLMs" - explain WHAT you did, which tools were used and what it taught you.
- Don't just say "I deployed systems" - explain HOW, with concrete outcomes from the CV.
- Connect experience to action explicitly: show HOW the specific skills from past work apply to the current action.
- You can infer related work: if the CV mentions a technology, you can reference related activities like evaluation, data preprocessing or optimization.

Example format (GOOD - specific and connected):
**Title:** Build RAG System for Internal Documentation
**Objective:** Enable developers to quickly find relevant code examples and documentation patterns, reducing onboarding time and improving code quality.
**Experience:** At SEELab, I built RAG systems using OpenAI GPT to generate candidate answers and ground-truth references for sensor QA datasets, and implemented exact-match accuracy metrics for rigorous model evaluation.
**Action:** I'll set up a vector database for code embeddings, implement semantic search over documentation, create evaluation metrics to measure retrieval quality, and iterate based on developer feedback.

Example format (BAD - too vague):
**Title:** Build RAG System
**Objective:** Help developers find documentation.
**Experience:** Leveraging my work at SEELab where I contributed to developing LLMs, I'll apply similar techniques.
**Action:** Build a RAG system.

PLAN REQUIREMENTS:
1. Is SPECIFIC to {company_name} - reference their business, products, or known challenges based on your research
2. Demonstrates strategic thinking about what {company_name} needs based on the job description
3. Include the Experience field in about 70% of plan items, with concrete projects, technologies and outcomes from {first_name}'s CV

Write in first person."###;

/// Job-fit system prompt. Replace `{cv}` before sending.
pub const FIT_SYSTEM_TEMPLATE: &str = r#"{cv}

You are evaluating job fit. Be GENEROUS and ACCEPTING of broader concepts - check requirements if there's any reasonable connection through related technologies, methodologies, or domains. For example, if a job requires "Vision Transformers" and the candidate has computer vision experience AND transformer experience, check it even if not the exact same technology. Don't be overly decisive - accept broader conceptual matches."#;

/// Job-fit prompt. Replace `{candidate_name}`, `{first_name}`,
/// `{company_name}` and `{job_description}` before sending.
pub const FIT_PROMPT_TEMPLATE: &str = r#"You are analyzing job requirements for {company_name} and evaluating how well {candidate_name}'s experience and skills match.

JOB DESCRIPTION:
{job_description}

YOUR TASK:
1. Extract or infer key job requirements from the job description. If explicit requirements are listed, use those. If not, infer requirements based on:
   - Technical skills mentioned (programming languages, frameworks, tools, platforms)
   - Domain knowledge mentioned (ML, computer vision, NLP, etc.)
   - Experience level expectations
   - Responsibilities mentioned that imply certain skills

2. For EACH requirement, evaluate if {first_name} has relevant experience or skills based on the CV. Be GENEROUS:
   - Check a requirement if there is ANY reasonable connection to {first_name}'s experience, even if indirect
   - Consider related skills (e.g., TensorFlow vs PyTorch are both deep learning frameworks)
   - Consider transferable skills and methodologies
   - Do NOT check if there is genuinely NO correlation

3. Output as JSON with this exact format:
{
  "requirements": [
    {
      "requirement": "Python programming",
      "matches": true,
      "evidence": "Strong Python experience across all roles - used at BILL, SEELab, PromoDrone, and in projects."
    },
    {
      "requirement": "Kubernetes",
      "matches": false,
      "evidence": "I have closely related experience in Docker and AWS ECS container orchestration and Kubernetes demonstrates the same underlying skills of container management and orchestration. The primary risk is lack of direct Kubernetes experience, which is mitigated by my demonstrated ability to quickly learn new technologies."
    }
  ]
}

CRITICAL FORMAT FOR UNMATCHED REQUIREMENTS (matches: false):
If a requirement does NOT match, the evidence MUST follow this exact format:
"I have closely related experience in X and Y demonstrates the same underlying skills [describe the skills]. The primary risk is R [describe the risk], which is mitigated by M [describe the mitigation]."

IMPORTANT:
- Include 8-15 requirements (mix of technical skills, tools, methodologies, domain knowledge)
- Provide specific evidence from the CV for each match
- Sort requirements by importance to the role (most important first)"#;

/// System prompt for extracting a job description from a scraped page.
pub const SCRAPE_EXTRACTION_SYSTEM: &str = "You are a tool that extracts job descriptions from web pages. Return only the clean job description text, nothing else.";

/// Scrape extraction prompt. Replace `{page_text}` before sending.
pub const SCRAPE_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the job description from the following scraped webpage content. Return ONLY the job description text, without any HTML tags or extra formatting. Focus on:
- Job title and role
- Responsibilities and requirements
- Required skills and qualifications
- Preferred qualifications
- Company information relevant to the role

If you cannot find a job description, return "No job description found."

Webpage content:
{page_text}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_prompt_keeps_both_section_headers() {
        assert!(PLAN_PROMPT_TEMPLATE.contains("Start with \"## Research & Context\" section"));
        assert!(PLAN_PROMPT_TEMPLATE.contains("Then provide \"## First 90 Days Plan\""));
        assert!(PLAN_PROMPT_TEMPLATE.trim_end().ends_with("Write in first person."));
    }
}
