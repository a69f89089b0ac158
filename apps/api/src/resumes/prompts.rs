// Prompt constants for resume generation.
// Placeholders are filled by `llm_client::prompts::render_template`.

/// System prompt: HTML-only output, no commentary.
pub const RESUME_SYSTEM: &str = "You are an expert resume writer and front-end developer. \
    You produce complete, single-page HTML resumes. \
    You MUST respond with the HTML document only. \
    Do NOT include explanations, commentary or markdown code fences.";

/// Resume generation prompt template.
/// Replace: {profile_json}, {job_title}, {company_name}, {job_description},
///          {template_example}, {custom_instructions}
pub const RESUME_PROMPT_TEMPLATE: &str = r#"Generate a professional, single-page HTML resume tailored to the job below.

You are given:
1. PROFILE_DATA: a JSON object with the candidate's full profile.
2. TARGET ROLE and JOB_DESCRIPTION: the position the candidate is applying for.
3. HTML_TEMPLATE: an example HTML document whose structure, class names and CSS you must reuse.

Your task:
1. Analyze the JOB_DESCRIPTION for key skills and requirements.
2. Find the experiences, education, projects and awards in PROFILE_DATA that match them.
3. Rewrite the description of every experience, project and award so it speaks to this role. Include metrics showing how the work improved the organization; where the profile gives none, estimate them conservatively.
4. Rephrase bullet points to use keywords from the job description.
5. Format the entire output as one complete HTML document using the exact structure, class names and CSS of HTML_TEMPLATE.
6. The output must be only HTML. It must start with `<!DOCTYPE html>` and end with `</html>`.

---
TARGET ROLE: {job_title} at {company_name}
---
PROFILE_DATA:
{profile_json}
---
JOB_DESCRIPTION:
{job_description}
---
HTML_TEMPLATE:
{template_example}
---
ADDITIONAL INSTRUCTIONS FROM THE CANDIDATE:
{custom_instructions}
---

Now generate the tailored HTML resume."#;

/// Used when the candidate has not written any custom instructions.
pub const NO_CUSTOM_INSTRUCTIONS: &str = "None.";
