use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::keys::MISSION_CACHE;
use super::store::KeyValueStore;
use crate::providers::ChatMessage;
use crate::query::normalize;

const MISSION_MAX_SENTENCES: usize = 3;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

pub fn mission_prompt(company: &str) -> ChatMessage {
    ChatMessage::user(format!(
        "In 2-3 concise sentences and without any additional commentary or internal reasoning, \
         describe the core mission and values of the company \"{company}\" so an applicant can \
         reference them before interviews. Respond plainly."
    ))
}

/// Strips markup and wrapping quotes, then keeps the first three sentences,
/// one per line.
pub fn clean_mission_summary(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    let unquoted = without_tags.trim().trim_matches('"');
    split_sentences(unquoted)
        .into_iter()
        .take(MISSION_MAX_SENTENCES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        if chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            sentences.push(&text[start..end]);
            while chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
                chars.next();
            }
            start = chars.peek().map_or(text.len(), |(j, _)| *j);
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Mission summaries already generated, keyed by normalized company name.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct MissionCache(BTreeMap<String, String>);

impl MissionCache {
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        Ok(store.get(MISSION_CACHE)?.unwrap_or_default())
    }

    pub fn get(&self, company: &str) -> Option<&str> {
        self.0.get(&normalize(company)).map(String::as_str)
    }

    pub fn insert<S: KeyValueStore>(&mut self, store: &S, company: &str, summary: String) -> Result<()> {
        self.0.insert(normalize(company), summary);
        store.set(MISSION_CACHE, self)
    }
}

pub fn mock_interview_opening(company: Option<&str>, role: Option<&str>) -> ChatMessage {
    let at = company.map(|c| format!(" working at {c}")).unwrap_or_default();
    let as_role = role.map(|r| format!(" as a {r}")).unwrap_or_default();
    ChatMessage::assistant(format!(
        "Welcome to your mock interview! I will act as your interviewer. Let's begin.\n\n\
         First, can you tell me a little about yourself and why you're interested in{at}{as_role}?"
    ))
}

pub fn mock_interview_system(company: Option<&str>, role: Option<&str>) -> ChatMessage {
    let for_company = company.map(|c| format!(" {c}")).unwrap_or_default();
    let for_role = role
        .map(|r| format!(", interviewing for the role of {r}"))
        .unwrap_or_default();
    ChatMessage::system(format!(
        "You are a professional interviewer for{for_company}{for_role}. Continue the mock interview. \
         Ask behavioral and role-specific questions, give feedback, and follow up based on the \
         candidate's answers. Be conversational and supportive."
    ))
}

/// The transcript sent for the next interviewer turn: system prompt first,
/// then every message so far.
pub fn mock_interview_turn(
    company: Option<&str>,
    role: Option<&str>,
    transcript: &[ChatMessage],
) -> Vec<ChatMessage> {
    std::iter::once(mock_interview_system(company, role))
        .chain(transcript.iter().cloned())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarStory {
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: Option<String>,
}

impl StarStory {
    /// `None` until situation, task and action are all filled in.
    pub fn prompt(&self) -> Option<ChatMessage> {
        if [&self.situation, &self.task, &self.action]
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return None;
        }
        let result = self
            .result
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| format!("Result: {r}"))
            .unwrap_or_default();
        Some(ChatMessage::user(format!(
            "Improve this STAR story for a behavioral interview. Make it more impactful and \
             professional while maintaining the core message. Add specific details and metrics \
             where appropriate.\n\n\
             Situation: {}\nTask: {}\nAction: {}\n{result}\n\n\
             Format the response with clear sections and bullet points for key achievements.",
            self.situation, self.task, self.action
        )))
    }
}

/// `choices[0].message.content` of a completion envelope, if non-empty.
pub fn first_reply_content(envelope: &Value) -> Option<String> {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
