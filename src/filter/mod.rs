//! Query planning and local post-filtering.
//!
//! The remote search API supports exact single-value field matching only.
//! Free-text search and "one of N values" field matching have to be
//! evaluated locally over the fetched candidates. [`QueryPlan::build`]
//! splits a parameter set into the remote request map and the local
//! passes; [`search`] runs the fetch and applies the passes in order.

use crate::error::Result;
use crate::model::{Issue, NamedRef};
use crate::param::{
    IS_COMMENTS_PARAM, IS_DESCRIPTION_PARAM, IS_SUBJECT_PARAM, ParameterMap, ParameterValue,
    QUERY_PARAM, SearchParameter,
};
use crate::remote::RemoteClient;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Field names the multi-value pass knows how to evaluate locally.
const MULTI_VALUE_FIELDS: &[&str] = &[
    "tracker_id",
    "status_id",
    "priority_id",
    "assigned_to_id",
    "category_id",
    "fixed_version_id",
];

/// Per-query context supplied by the owning repository connection.
#[derive(Debug, Clone)]
pub struct SearchContext {
    /// Every query is scoped to exactly one project.
    pub project_id: String,
}

impl SearchContext {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

/// The free-text pass configuration, extracted from the reserved
/// `query` / `is_*` parameters.
#[derive(Debug, Clone, Default)]
pub struct TextFilter {
    query: String,
    subject: bool,
    description: bool,
    comments: bool,
}

impl TextFilter {
    /// Active iff there is query text and at least one field flag is set.
    ///
    /// `comments` alone still activates the pass, which then matches
    /// nothing - comment bodies are not part of the fetched record.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() && (self.subject || self.description || self.comments)
    }

    /// Case-insensitive containment over the flagged fields.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        let needle = self.query.to_lowercase();
        if self.subject && issue.subject.to_lowercase().contains(&needle) {
            return true;
        }
        if self.description
            && issue
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
        {
            return true;
        }
        // comments: recognized but inert, see IS_COMMENTS_PARAM.
        false
    }
}

/// The remote/local split for one search invocation.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    remote_request: BTreeMap<String, String>,
    multi_value: Vec<SearchParameter>,
    text: TextFilter,
}

impl QueryPlan {
    /// Split a parameter set into remote request fields and local passes.
    ///
    /// Reserved parameters (`query`, `is_subject`, `is_description`,
    /// `is_comments`) never reach the remote request. Blank parameters
    /// are inert. A parameter with exactly one non-blank value is sent
    /// remotely; with more than one it joins the multi-value set. The
    /// context's project id is always injected.
    #[must_use]
    pub fn build(parameters: &ParameterMap, context: &SearchContext) -> Self {
        let mut plan = Self::default();
        plan.remote_request
            .insert("project_id".to_string(), context.project_id.clone());

        for (name, parameter) in parameters {
            match name.as_str() {
                QUERY_PARAM => {
                    // Free text is a single value; a malformed payload
                    // with extras still filters on the first one.
                    plan.text.query = parameter
                        .non_blank_values()
                        .next()
                        .map(|v| v.as_str().to_string())
                        .unwrap_or_default();
                }
                IS_SUBJECT_PARAM => plan.text.subject = parameter.is_truthy_flag(),
                IS_DESCRIPTION_PARAM => plan.text.description = parameter.is_truthy_flag(),
                IS_COMMENTS_PARAM => plan.text.comments = parameter.is_truthy_flag(),
                _ => {
                    if parameter.is_blank() {
                        continue;
                    }
                    if let Some(value) = parameter.single_value() {
                        plan.remote_request
                            .insert(name.clone(), value.as_str().to_string());
                    } else {
                        plan.multi_value.push(parameter.clone());
                    }
                }
            }
        }
        plan
    }

    /// The assembled remote request map.
    #[must_use]
    pub fn remote_request(&self) -> &BTreeMap<String, String> {
        &self.remote_request
    }

    /// Parameters deferred to the local multi-value pass.
    #[must_use]
    pub fn multi_value_parameters(&self) -> &[SearchParameter] {
        &self.multi_value
    }

    /// The text pass configuration.
    #[must_use]
    pub fn text_filter(&self) -> &TextFilter {
        &self.text
    }

    /// Apply the local passes in order: text, then multi-value. Each
    /// pass narrows the previous pass's result, preserving fetch order.
    #[must_use]
    pub fn apply_local(&self, mut issues: Vec<Issue>) -> Vec<Issue> {
        if self.text.is_active() {
            issues.retain(|issue| self.text.matches(issue));
        }
        if !self.multi_value.is_empty() {
            issues.retain(|issue| self.matches_multi_value(issue));
        }
        issues
    }

    /// AND across parameters, OR within a parameter's values.
    fn matches_multi_value(&self, issue: &Issue) -> bool {
        self.multi_value.iter().all(|parameter| {
            let Some(field) = reference_field(issue, parameter.name()) else {
                // Fail-open: an unknown field name contributes no
                // filtering rather than rejecting the issue.
                warn!(parameter = parameter.name(), "unsupported multi-value parameter");
                return true;
            };
            parameter
                .non_blank_values()
                .any(|value| value_matches(field, value))
        })
    }
}

/// Resolve a multi-value parameter name to the issue field it filters.
/// Returns `None` for unrecognized names.
fn reference_field<'a>(issue: &'a Issue, name: &str) -> Option<&'a Option<NamedRef>> {
    if !MULTI_VALUE_FIELDS.contains(&name) {
        return None;
    }
    match name {
        "tracker_id" => Some(&issue.tracker),
        "status_id" => Some(&issue.status),
        "priority_id" => Some(&issue.priority),
        "assigned_to_id" => Some(&issue.assignee),
        "category_id" => Some(&issue.category),
        "fixed_version_id" => Some(&issue.target_version),
        _ => None,
    }
}

/// A value matches when the stringified field id equals it, or when the
/// NONE sentinel meets an absent field.
fn value_matches(field: &Option<NamedRef>, value: &ParameterValue) -> bool {
    match field {
        None => value.is_none_sentinel(),
        Some(reference) => reference.id.to_string() == value.as_str(),
    }
}

/// Perform one search: remote fetch with the plan's request map, then
/// the local passes over the candidates.
///
/// # Errors
///
/// Propagates any transport, authentication, not-found, or protocol
/// error from the remote fetch unchanged; no partial result is returned.
pub fn search(client: &dyn RemoteClient, plan: &QueryPlan) -> Result<Vec<Issue>> {
    let fetched = client.fetch_issues(plan.remote_request())?;
    debug!(
        candidates = fetched.len(),
        text = plan.text.is_active(),
        multi_value = plan.multi_value.len(),
        "remote fetch complete"
    );
    Ok(plan.apply_local(fetched))
}
