// Prompt templates for the generative scorer.
// Cross-cutting fragments come from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobDescription;

/// System prompt for both prompting modes.
const SCORING_SYSTEM_PREFIX: &str =
    "You are an experienced technical recruiter who evaluates candidates for job positions.";

/// Scoring scale shared by batch and per-candidate prompts.
const SCORE_SCALE_INSTRUCTION: &str = "\
    Scores are real numbers from 0 to 10 inclusive, where 10 is an ideal match. \
    Weigh title fit, required skills, years of experience against the requirement, \
    industry experience and location. \
    Each explanation must be one or two sentences citing concrete evidence from the profile.";

/// Batch prompt. Replace `{scale}`, `{selection}`, `{job}` and `{candidates}` before sending.
const BATCH_PROMPT_TEMPLATE: &str = r#"Based on the job description below, evaluate and rank the candidates provided.
{scale}
{selection}

Return a JSON array with this EXACT schema (no extra fields):
[
  {
    "full_name": "Candidate Name",
    "score": 8.5,
    "explanation": "Reason for the score"
  }
]
Use each candidate's name exactly as written in the profile.

Job Description:
{job}

Candidate Profiles:
{candidates}"#;

/// Per-candidate prompt. Replace `{scale}`, `{job}` and `{candidate}` before sending.
const CANDIDATE_PROMPT_TEMPLATE: &str = r#"Based on the job description below, evaluate how well this single candidate fits the role.
{scale}

Return a JSON object with this EXACT schema (no extra fields):
{
  "full_name": "Candidate Name",
  "score": 8.5,
  "explanation": "Reason for the score"
}

Job Description:
{job}

Candidate Profile:
{candidate}"#;

pub fn system_prompt() -> String {
    format!("{SCORING_SYSTEM_PREFIX} {JSON_ONLY_INSTRUCTION}")
}

/// One prompt embedding the job and every candidate. `top_n` asks for only the best N.
pub fn batch_prompt(
    job: &JobDescription,
    candidates: &[CandidateRecord],
    top_n: Option<usize>,
) -> String {
    let selection = match top_n {
        Some(n) => format!("Return only the top {n} candidates, best first."),
        None => "Return one entry for every candidate.".to_string(),
    };

    let profiles = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("Candidate {}:\n{}", i + 1, format_candidate(c)))
        .collect::<Vec<_>>()
        .join("\n\n");

    fill_template(
        BATCH_PROMPT_TEMPLATE,
        &[
            ("{scale}", SCORE_SCALE_INSTRUCTION),
            ("{selection}", &selection),
            ("{job}", &format_job(job)),
            ("{candidates}", &profiles),
        ],
    )
}

pub fn candidate_prompt(job: &JobDescription, candidate: &CandidateRecord) -> String {
    fill_template(
        CANDIDATE_PROMPT_TEMPLATE,
        &[
            ("{scale}", SCORE_SCALE_INSTRUCTION),
            ("{job}", &format_job(job)),
            ("{candidate}", &format_candidate(candidate)),
        ],
    )
}

/// Substitutes placeholders in a single pass over the template, so text
/// inserted from job or candidate fields is never scanned for placeholders.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn format_job(job: &JobDescription) -> String {
    format!(
        "Client: {}\nProblem Statement: {}\nTitle: {}\nLocation: {}\nIndustry: {}\nRequired Skills: {}\nYears of Experience Required: {}",
        or_na(&job.cst_name),
        or_na(&job.client_problem_statement),
        or_na(&job.title),
        or_na(&job.location),
        or_na(&job.industry),
        or_na(&job.required_skills),
        job.years_experience,
    )
}

fn format_candidate(candidate: &CandidateRecord) -> String {
    format!(
        "Name: {}\nTitle: {}\nSkills: {}\nExperience: {} years\nIndustry Experience: {}\nLocation: {}",
        candidate.full_name(),
        or_na(&candidate.title),
        or_na(&candidate.skills),
        candidate.years_experience,
        or_na(&candidate.industry_experience),
        or_na(&candidate.location),
    )
}

fn or_na(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}
