//! System instruction and user prompt construction.
//!
//! Two mutually exclusive user-prompt branches exist: one that fills a
//! caller-supplied format template and one that builds a README from scratch.
//! Which branch runs is decided by whether the template resolver produced a
//! template body for this request.

use crate::request::GenerateRequest;

/// At most this many file names are listed when a template is supplied.
const MAX_TEMPLATE_FILES: usize = 10;

/// At most this many characters of source code are quoted in the template
/// branch.
const MAX_CODE_SAMPLE_CHARS: usize = 1000;

/// Badge every generated README must carry at the very bottom.
pub const GENERATOR_BADGE: &str = "[![Generated with readmegen](https://img.shields.io/badge/Generated%20with-readmegen-brightgreen)](https://github.com/cloudbridgeuy/readmegen)";

/// Standing instruction sent with every generation call.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a README documentation specialist.

When the project is a backend service (API servers, databases, authentication
systems), document it with technical precision:

- An overview naming the key frameworks and languages.
- A features list mapping each technology to its purpose.
- Installation steps and every required environment variable, with examples.
- Full API documentation: base URL, then every endpoint with its HTTP method,
  request payload, success response, and error statuses. Do not skip
  endpoints and do not collapse them into summary/details tags.
- Exact request and response schemas.
- No emojis and no promotional language for backend projects.

For non-backend projects use standard README formatting. At most one or two
emojis, and only where they match the adjacent text. Reference screenshots
only when the project files actually contain image files.

Universal rules:
- Never wrap the whole README in a markdown code block.
- Write like a human author, with proper Markdown formatting.
- Always include the generator badge at the very bottom of the README.";

/// Build the user prompt for one request.
///
/// `template` is the resolved format template, if the template resolver
/// succeeded; `None` selects the default construction branch.
pub fn build_user_prompt(request: &GenerateRequest, template: Option<&str>) -> String {
    match template {
        Some(template) => template_prompt(request, template),
        None => default_prompt(request),
    }
}

fn template_prompt(request: &GenerateRequest, template: &str) -> String {
    let files = request
        .project_files
        .iter()
        .take(MAX_TEMPLATE_FILES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Template structure:\n{template}\n\n\
         Project Details:\n\
         - Repo URL: {repo}\n\
         - Project Type: {project_type}\n\
         - Main Files: {files}\n\
         - Code Sample: {code}\n\n\
         Rules:\n\
         1. Preserve all template sections\n\
         2. Replace content but keep styling\n\
         3. Add this badge at the bottom:\n   {badge}",
        template = template,
        repo = request.repo_url,
        project_type = request.project_type,
        files = files,
        code = truncate_chars(&request.full_code, MAX_CODE_SAMPLE_CHARS),
        badge = GENERATOR_BADGE,
    )
}

fn default_prompt(request: &GenerateRequest) -> String {
    let setup = if request.option("includeSetup") {
        "yes"
    } else {
        "<!-- SKIP SECTION: User opted out of Installation Instructions -->"
    };
    let contribution = if request.option("includeContributionGuideLine") {
        "yes"
    } else {
        "<!-- SKIP SECTION: User opted out of contribution guidelines -->"
    };

    format!(
        "Generate a high-quality, professional, and modern README.md for a **{project_type}** project.\n\n\
         ## Project Overview:\n\
         The project includes the following files:\n{files}\n\n\
         ## Full Code Context:\n\
         Below is the complete source code of the project:\n{code}\n\n\
         ## README Requirements:\n\
         1. **Title**: a clear title taken from the project metadata files (package.json, go.mod, Cargo.toml, ...) when present, otherwise a reasonable human-sounding name. At most one emoji, and only if it matches the title.\n\
         2. **Description**: a short, engaging description with modern formatting. Keep emojis sparse.\n\
         3. **Installation**:\n   {setup}\n   - Clone the repository:\n     ```bash\n     git clone {repo}\n     ```\n   - Step-by-step local setup instructions with code blocks.\n\
         4. **Usage**: detailed usage instructions with examples. Only reference screenshots if the project files include image files. Do not collapse these instructions.\n\
         5. **Features**: a list of key features with brief descriptions.\n\
         6. **Technologies Used**: a table of technologies with links.\n\
         7. **Contributing**:\n   {contribution}\n   - Guidelines for contributing to the project.\n\
         8. **License**: include a license section only if the project files contain a license file.\n\
         9. **Author Info**: an author section with placeholder social links; never guess usernames.\n\
         10. **Badges**: dynamic badges for the technologies used.\n\
         11. **Generator Badge**: always include this badge at the very bottom:\n    {badge}\n\n\
         ## Tone and Style:\n\
         Match the project: eye-catching for modern projects, clean and formal for professional ones. Never overload the README with emojis.\n\n\
         ## Final Output:\n\
         Output the README.md content directly, without explanations and without wrapping it in a markdown code block.",
        project_type = request.project_type,
        files = request.project_files.join("\n"),
        code = request.full_code,
        setup = setup,
        repo = request.repo_url,
        contribution = contribution,
        badge = GENERATOR_BADGE,
    )
}

/// Truncate to at most `max` characters without splitting a UTF-8 scalar.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
