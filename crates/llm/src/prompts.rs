use teller_core::IntentLabel;

pub const SUPPORT_SYSTEM_PROMPT: &str = "You are a helpful banking customer service assistant.
Your job is to provide clear, friendly, and professional responses to customer queries.

Guidelines:
- Be concise but thorough
- Use a warm, professional tone
- Address the specific question asked
- If the template provides key information, incorporate it naturally
- Don't make up information - stick to what's provided
- Keep responses under 100 words unless more detail is needed
";

pub const CONVERSATION_SYSTEM_PROMPT: &str = "You are a helpful banking customer service assistant.
Provide clear, accurate, and professional responses to customer queries.";

pub const APOLOGY_REPLY: &str = "I apologize, but I'm having trouble processing your request right now. Please try again or contact support.";

pub fn support_user_prompt(user_query: &str, intent: &IntentLabel, template: &str) -> String {
    format!(
        "The customer asked: \"{user_query}\"

We've identified this as a \"{intent}\" query.

Our standard response template says: \"{template}\"

Please generate a personalized, natural response that:
1. Directly addresses their specific question
2. Incorporates the key information from the template
3. Sounds conversational and helpful
4. Matches the tone of a professional banking support agent

Response:"
    )
}
