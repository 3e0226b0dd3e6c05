//! Interview insights from the company-review provider.
//!
//! The lookup resolves a company to an employer id, pulls a page of
//! interview reviews and folds them into one [`InterviewRecord`]. Every
//! failure along the way still produces a record (with `note`/`error`
//! explaining what happened) so callers always have something to render.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::providers::ReviewProvider;
use crate::query::CompanyQuery;

pub const MAX_QUESTIONS: usize = 20;
pub const INTERVIEW_LIMIT: usize = 20;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const VARIOUS_POSITIONS: &str = "Various positions";
pub const PROCESS_UNAVAILABLE: &str = "Interview process information not available";
pub const NO_PROCESS_DESCRIPTION: &str = "No detailed process description available";

/// Questions shorter than this (after trimming) are noise like "N/A".
const MIN_QUESTION_CHARS: usize = 10;
const MIN_PROCESS_CLAUSE_CHARS: usize = 15;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    pub employer: String,
    pub difficulty: String,
    pub experience: String,
    pub job_title: String,
    pub outcome: String,
    pub process: String,
    pub questions: Vec<String>,
    pub interview_count: usize,
    pub has_company_info: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_interviews: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub questions_found: Option<usize>,
}

impl InterviewRecord {
    /// Record with every field at its "nothing known" value.
    pub fn empty(employer: impl Into<String>, has_company_info: bool) -> Self {
        InterviewRecord {
            employer: employer.into(),
            difficulty: NOT_SPECIFIED.to_string(),
            experience: NOT_SPECIFIED.to_string(),
            job_title: VARIOUS_POSITIONS.to_string(),
            outcome: NOT_SPECIFIED.to_string(),
            process: PROCESS_UNAVAILABLE.to_string(),
            questions: Vec::new(),
            interview_count: 0,
            has_company_info,
            note: None,
            error: None,
            total_interviews: None,
            questions_found: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// =============================================================================
// Response probing
// =============================================================================

type Extractor = fn(&Value) -> Option<&Vec<Value>>;

fn non_empty_array(v: Option<&Value>) -> Option<&Vec<Value>> {
    v?.as_array().filter(|a| !a.is_empty())
}

fn top_level_interviews(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.get("interviews"))
}

fn data_interviews(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.pointer("/data/interviews"))
}

fn employer_interviews_list(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.pointer("/data/employerInterviews"))
}

fn employer_interviews_nested(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.pointer("/data/employerInterviews/interviews"))
}

/// Places the review list has been seen in, most common first.
const REVIEW_EXTRACTORS: [Extractor; 4] = [
    top_level_interviews,
    data_interviews,
    employer_interviews_list,
    employer_interviews_nested,
];

/// First non-empty review list found in an interviews response.
pub fn extract_reviews(body: &Value) -> Option<&Vec<Value>> {
    REVIEW_EXTRACTORS.iter().find_map(|extract| extract(body))
}

fn data_employer_results(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.pointer("/data/employerResults"))
}

fn top_level_employer_results(body: &Value) -> Option<&Vec<Value>> {
    non_empty_array(body.get("employerResults"))
}

const EMPLOYER_EXTRACTORS: [Extractor; 2] = [data_employer_results, top_level_employer_results];

#[derive(Debug, Clone, PartialEq)]
pub struct EmployerMatch {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Best employer match from a company-search response.
pub fn extract_employer(body: &Value) -> Option<EmployerMatch> {
    let first = EMPLOYER_EXTRACTORS
        .iter()
        .find_map(|extract| extract(body))?
        .first()?;
    let employer = first.get("employer").unwrap_or(first);

    Some(EmployerMatch {
        id: employer.get("id").and_then(as_text),
        name: employer
            .get("name")
            .and_then(as_text)
            .or_else(|| employer.get("shortName").and_then(as_text)),
    })
}

/// Provider-level failure reported inside a 200 search response.
fn search_failure(body: &Value) -> Option<String> {
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        let message = as_text(err).unwrap_or_else(|| err.to_string());
        return Some(format!("API Error: {message}"));
    }
    match body.get("status").and_then(Value::as_bool) {
        Some(true) => None,
        _ => Some("API Error: Request failed".to_string()),
    }
}

/// Non-empty strings as-is, numbers rendered; everything else is absent.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn job_title(review: &Value) -> Option<String> {
    let title = review.get("jobTitle")?;
    match title {
        Value::Object(_) => title.get("text").and_then(as_text),
        other => as_text(other),
    }
}

fn review_questions(review: &Value) -> Vec<String> {
    let Some(items) = review.get("userQuestions").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|q| match q {
            Value::Object(_) => ["question", "text", "content"]
                .iter()
                .find_map(|k| {
                    q.get(*k)
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                }),
            other => other.as_str(),
        })
        .map(str::trim)
        .filter(|q| q.chars().count() > MIN_QUESTION_CHARS)
        .map(str::to_string)
        .collect()
}

/// Clauses of a free-text process description that read like questions.
pub fn process_questions(description: &str) -> Vec<String> {
    description
        .split(['.', '!'])
        .filter(|clause| clause.contains('?'))
        .map(str::trim)
        .filter(|clause| clause.chars().count() > MIN_PROCESS_CLAUSE_CHARS)
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Aggregation
// =============================================================================

/// Most frequent value; ties go to the value seen first.
pub fn most_common(values: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for v in values {
        let count = counts[v.as_str()];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((v.as_str(), count));
        }
    }
    best.map(|(v, _)| v.to_string())
}

/// Drops exact duplicates (keeping first occurrences) and caps the list.
pub fn dedupe_questions(questions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    questions
        .into_iter()
        .filter(|q| seen.insert(q.clone()))
        .take(MAX_QUESTIONS)
        .collect()
}

/// Longest description; the earliest one wins a tie.
fn longest(descriptions: &[String]) -> Option<&String> {
    descriptions.iter().fold(None, |best: Option<&String>, d| match best {
        Some(b) if b.chars().count() >= d.chars().count() => Some(b),
        _ => Some(d),
    })
}

/// Folds raw review objects into one record for `employer`.
pub fn aggregate(employer: &str, reviews: &[Value]) -> InterviewRecord {
    let field = |name: &str| -> Vec<String> {
        reviews
            .iter()
            .filter_map(|r| r.get(name).and_then(as_text))
            .collect()
    };
    let difficulties = field("difficulty");
    let experiences = field("experience");
    let outcomes = field("outcome");
    let titles: Vec<String> = reviews.iter().filter_map(job_title).collect();
    let descriptions = field("processDescription");

    let mut questions = Vec::new();
    for review in reviews {
        questions.extend(review_questions(review));
        if let Some(description) = review.get("processDescription").and_then(Value::as_str) {
            questions.extend(process_questions(description));
        }
    }
    let questions = dedupe_questions(questions);
    let or_unspecified = |v: Option<String>| v.unwrap_or_else(|| NOT_SPECIFIED.to_string());

    InterviewRecord {
        employer: employer.to_string(),
        difficulty: or_unspecified(most_common(&difficulties)),
        experience: or_unspecified(most_common(&experiences)),
        job_title: or_unspecified(most_common(&titles)),
        outcome: or_unspecified(most_common(&outcomes)),
        process: longest(&descriptions)
            .cloned()
            .unwrap_or_else(|| NO_PROCESS_DESCRIPTION.to_string()),
        interview_count: reviews.len(),
        has_company_info: true,
        note: None,
        error: None,
        total_interviews: Some(reviews.len()),
        questions_found: Some(questions.len()),
        questions,
    }
}

// =============================================================================
// Service
// =============================================================================

pub struct InterviewService {
    provider: Arc<dyn ReviewProvider>,
    cache: Arc<TtlCache<InterviewRecord>>,
}

impl InterviewService {
    pub fn new(provider: Arc<dyn ReviewProvider>, cache: Arc<TtlCache<InterviewRecord>>) -> Self {
        Self { provider, cache }
    }

    /// Always returns a record; provider trouble is reported inside it.
    #[tracing::instrument(skip_all, fields(company = %company.normalized()))]
    pub async fn lookup(&self, company: &CompanyQuery) -> InterviewRecord {
        let key = company.normalized();
        if let Some(hit) = self.cache.get(key).await {
            log::debug!("interview cache hit for {key}");
            return hit;
        }

        let record = self.fetch(company.raw()).await;
        if record.interview_count > 0 {
            if let Err(e) = self.cache.put(key, record.clone()).await {
                log::warn!("failed to write interview cache: {:#}", e);
            }
        }
        record
    }

    async fn fetch(&self, company: &str) -> InterviewRecord {
        let search = match self.provider.search_companies(company).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("company search for {company} failed: {:#}", e);
                return InterviewRecord::empty(company, false)
                    .with_note("Interview data could not be retrieved right now")
                    .with_error(format!("{e:#}"));
            }
        };

        if let Some(failure) = search_failure(&search) {
            log::warn!("company search for {company} rejected: {failure}");
            return InterviewRecord::empty(company, false)
                .with_note("Interview data could not be retrieved right now")
                .with_error(failure);
        }

        let Some(employer) = extract_employer(&search) else {
            return InterviewRecord::empty(company, false)
                .with_note(format!("No companies found matching \"{company}\""));
        };
        let name = employer.name.unwrap_or_else(|| company.to_string());
        let Some(employer_id) = employer.id else {
            return InterviewRecord::empty(name, true)
                .with_error("Employer ID not found in search results");
        };
        log::info!("resolved {company} to employer {name} ({employer_id})");

        let body = match self.provider.interviews(&employer_id, INTERVIEW_LIMIT).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("interview fetch for {name} failed: {:#}", e);
                return InterviewRecord::empty(name, true).with_error(format!("{e:#}"));
            }
        };

        match extract_reviews(&body) {
            Some(reviews) => aggregate(&name, reviews),
            None => self.overview_fallback(name, &employer_id).await,
        }
    }

    async fn overview_fallback(&self, name: String, employer_id: &str) -> InterviewRecord {
        log::info!("no interviews for {name}, trying the overview endpoint");
        match self.provider.overview(employer_id).await {
            Ok(_) => InterviewRecord::empty(name, true)
                .with_note("Company found but no interview details are publicly available"),
            Err(e) => {
                log::warn!("overview for {name} failed: {:#}", e);
                InterviewRecord::empty(name, true)
                    .with_note("This company may not have public interview data available")
                    .with_error("No interview data available for this company")
            }
        }
    }
}
