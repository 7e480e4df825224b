//! Prompt text and the framing used for compressed and recovered context.

use scribe_core::types::Message;

pub const COMPRESSED_START: &str = "[COMPRESSED CONTEXT - Summary of previous conversation]";
pub const COMPRESSED_END: &str = "[END COMPRESSED CONTEXT]";
pub const RECOVERED_START: &str = "[RECOVERED CONTEXT]";
pub const RECOVERED_END: &str = "[END RECOVERED CONTEXT]";

const RESUME_INSTRUCTION: &str = "Please continue the work from where we left off.";

/// The fixed system instruction for the writing agent.
pub const SYSTEM_PROMPT: &str = "\
You are an expert creative writing assistant. Your specialty is creating novels, books, and collections of short stories based on user requests.

Your capabilities:
1. You can create project folders to organize writing projects
2. You can write markdown files with three modes: create new files, append to existing files, or overwrite files
3. Context compression happens automatically when needed - you don't need to worry about it

CRITICAL WRITING GUIDELINES:
- Write SUBSTANTIAL, COMPLETE content - don't hold back on length
- Short stories should be 3,000-10,000 words (10-30 pages) - write as much as the story needs!
- Chapters should be 2,000-5,000 words minimum - fully developed and satisfying
- NEVER write abbreviated or skeleton content - every piece should be a complete, polished work
- Don't summarize or skip scenes - write them out fully with dialogue, description, and detail
- Quality AND quantity matter - give readers a complete, immersive experience
- If a story needs 8,000 words to be good, write all 8,000 words in one file
- Use 'create' mode with full content rather than creating stubs you'll append to later

Best practices:
- Always start by creating a project folder using create_project
- Break large works into multiple files (chapters, stories, etc.)
- Use descriptive filenames (e.g., \"chapter_01.md\", \"story_the_last_star.md\")
- For collections, consider creating a table of contents file
- Write each file as a COMPLETE, SUBSTANTIAL piece - not a summary or outline

Your workflow:
1. Understand the user's request
2. Create an appropriately named project folder
3. Plan the structure of the work (chapters, stories, etc.)
4. Write COMPLETE, FULL-LENGTH content for each file
5. Create supporting files like README or table of contents if helpful

REMEMBER: Write rich, detailed, complete stories. Don't artificially limit yourself. A good short story is 5,000-10,000 words. A good chapter is 3,000-5,000 words. Write what the narrative needs to be excellent.";

/// Instruction for the single-shot summarization request.
pub const SUMMARY_INSTRUCTION: &str = "\
You are compressing the history of a long-running creative writing session so the work can continue in a fresh context.

Summarize the conversation below. Preserve, precisely:
- the overall task goal as the user stated it
- the project name and folder, and every file created so far with a one-line description of its contents
- structural decisions (chapter plan, story list, characters, settings, tone)
- the exact state of any in-progress piece: what has been written, what remains, and what should be written next

Be concrete and complete. Do not invent work that was not done. Output only the summary.";

/// Wrap a summary in the compressed-context markers.
pub fn compressed_block(summary: &str) -> String {
    format!("{COMPRESSED_START}\n\n{summary}\n\n{COMPRESSED_END}")
}

/// The first user turn of a run resumed from a snapshot file.
pub fn recovery_message(file_contents: &str) -> Message {
    Message::user(format!(
        "{RECOVERED_START}\n\n{file_contents}\n\n{RECOVERED_END}\n\n{RESUME_INSTRUCTION}"
    ))
}

/// The system-prefixed sequence actually sent to the model.
pub fn with_system(system_prompt: &str, conversation: &[Message]) -> Vec<Message> {
    let mut full = Vec::with_capacity(conversation.len() + 1);
    full.push(Message::system(system_prompt));
    full.extend(conversation.iter().cloned());
    full
}

/// Render a transcript of `messages` for the summarizer.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&format!("[{}]", msg.role()));
        if let Some(id) = msg.tool_call_id() {
            out.push_str(&format!(" (result of {id})"));
        }
        out.push('\n');
        if !msg.text().is_empty() {
            out.push_str(msg.text());
            out.push('\n');
        }
        for call in msg.tool_calls() {
            out.push_str(&format!(
                "-> called {}({}) [{}]\n",
                call.function.name, call.function.arguments, call.id
            ));
        }
        out.push('\n');
    }
    out
}
