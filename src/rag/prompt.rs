//! Grounding prompt

use crate::config::PromptConfig;
use crate::graph::UserContext;
use crate::vector::RetrievedChunk;

/// Rendered in place of a relation the employee does not have
pub const ABSENT: &str = "not provided";

const RULE: &str = "----------------";

/// Renders the prompt that confines the model to the retrieved policy text.
/// Rendering is pure: equal inputs give byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub employer: String,
    pub assistant_role: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::from(&PromptConfig::default())
    }
}

impl From<&PromptConfig> for PromptTemplate {
    fn from(config: &PromptConfig) -> Self {
        Self {
            employer: config.employer.clone(),
            assistant_role: config.assistant_role.clone(),
        }
    }
}

/// Chunk texts in retrieval order, blank line between them
pub fn policy_block(chunks: &[RetrievedChunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

impl PromptTemplate {
    pub fn render(&self, user: &UserContext, policy_block: &str, question: &str) -> String {
        let or_absent = |v: &Option<String>| v.clone().unwrap_or_else(|| ABSENT.to_string());

        format!(
            "You are {employer}'s {role}.\n\
             \n\
             User role: {employment_type}\n\
             User name: {name}\n\
             Manager: {manager}\n\
             Mentor: {mentor}\n\
             Department: {department}\n\
             College: {college}\n\
             \n\
             Answer ONLY from the policy text below:\n\
             \n\
             {rule}\n\
             {block}\n\
             {rule}\n\
             \n\
             Question: {question}\n",
            employer = self.employer,
            role = self.assistant_role,
            employment_type = user.employment_type,
            name = user.name,
            manager = or_absent(&user.manager),
            mentor = or_absent(&user.mentor),
            department = or_absent(&user.department),
            college = or_absent(&user.college),
            rule = RULE,
            block = policy_block,
            question = question,
        )
    }
}
