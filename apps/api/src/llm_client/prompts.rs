/// System prompt for resume-vs-job-description scoring. The model must answer with
/// exactly the four-key JSON object parsed by the analysis client.
pub const ATS_ANALYSIS_SYSTEM: &str = r#"You are an expert ATS (Applicant Tracking System) analyzer. Your task is to compare a resume with a job description and provide detailed analysis.

Please analyze the resume against the job description and provide:
1. An ATS compatibility score (0-100)
2. Detailed feedback on strengths and areas for improvement
3. List of matched keywords between resume and job description
4. List of important keywords missing from the resume
5. Suggestions for improving ATS compatibility

Focus on:
- Keyword matching and density
- Skills alignment
- Experience relevance
- Industry-specific terminology
- Formatting and readability
- Missing qualifications

Respond in JSON format with the following structure:
{
    "score": <number between 0-100>,
    "feedback": "<detailed feedback string>",
    "matched_keywords": ["keyword1", "keyword2", ...],
    "missing_keywords": ["missing1", "missing2", ...]
}"#;

const ATS_ANALYSIS_USER_TEMPLATE: &str = "
RESUME TEXT:
{resume_text}

JOB DESCRIPTION:
{job_description}

Please analyze this resume against the job description and provide the ATS compatibility analysis in the specified JSON format.
";

/// Embeds both texts verbatim into the user message.
pub fn build_analysis_message(resume_text: &str, job_description: &str) -> String {
    // Job description goes in first so a literal "{resume_text}" inside it stays literal.
    ATS_ANALYSIS_USER_TEMPLATE
        .replacen("{job_description}", job_description, 1)
        .replacen("{resume_text}", resume_text, 1)
}
