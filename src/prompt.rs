const BEGINNER_RULE: &str = "Use very simple, high-frequency everyday words (A1–A2). \
Avoid rare, technical, abstract, or academic vocabulary.";

const INTERMEDIATE_RULE: &str = "Use B1–B2 level words that are a bit more challenging than everyday basics. \
Some abstract ideas and phrasal verbs are okay.";

const ADVANCED_RULE: &str = "Use C1–C2 level vocabulary, including formal, academic, or nuanced words. \
You can include idiomatic or specialized terms.";

pub const EXERCISE_INSTRUCTIONS: &str = r#"Using ONLY these words, create:

1. A matching exercise: words labeled A, B, C... and meanings labeled 1, 2, 3...
2. 5 fill-in-the-blank sentences, with a word bank shown below the sentences.
3. 3 prompts: "Use the word ___ in your own sentence."

Format everything cleanly in Markdown.
Do NOT give the answers."#;

const WORD_FORMAT: &str = r#"For each word, use this format:

### Word (part of speech)
- Meaning: very clear and learner-friendly
- Example: one natural sentence
- Synonyms: 2–3, if available
- Usage tip: when/where to use it (formality, context, etc.)

Do not add any intro or conclusion. Only output the list of words."#;

/// Rule text for a level name. Unknown names get no rule rather than an error.
pub fn level_rule(level: &str) -> &'static str {
    match level {
        "Beginner" => BEGINNER_RULE,
        "Intermediate" => INTERMEDIATE_RULE,
        "Advanced" => ADVANCED_RULE,
        _ => "",
    }
}

pub fn build_word_prompt(
    level: &str,
    interests: &str,
    tone: &str,
    word_count: u8,
    previous_words: &str,
) -> String {
    let rule = level_rule(level);
    format!(
        "
You are an English vocabulary coach.

Learner:
- Level: {level}
- Interests: {interests}
- Teaching style: {tone}

Level rules:
{rule}

Previously suggested words (avoid repeating these words and very close synonyms):
{previous_words}

Task:
Suggest exactly {word_count} new English words that follow the level rules and match the learner's interests.

{WORD_FORMAT}
"
    )
}

pub fn build_exercise_prompt<S: AsRef<str>>(saved_sets: &[S]) -> String {
    let words_block = join_sets(saved_sets);
    format!(
        "
You are an English teacher creating a practice worksheet.

Here are vocabulary sets saved by the learner (in Markdown):

{words_block}

{EXERCISE_INSTRUCTIONS}
"
    )
}

/// Joins word sets with a blank line between them, in the order given.
pub fn join_sets<S: AsRef<str>>(sets: &[S]) -> String {
    sets.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n")
}
