//! Persona prompt templates.
//!
//! Prompts are plain string templates over a [`DogProfile`]. They are pure:
//! the same profile and context always give the same bytes.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use dogtalk_profile::DogProfile;

/// Marker separating prompt text from an inline image payload.
pub const IMAGE_MARKER: &str = "[IMAGE]";

/// What the prompt is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptContext<'a> {
    /// The persona's opening line
    Greeting,
    /// Reply to a message from the owner
    Reply(&'a str),
    /// Analyze a photo (base64 data) and react in character
    Photo(&'a str),
}

/// The line the persona is asked to answer when the chat opens.
pub fn greeting_seed(profile: &DogProfile) -> String {
    format!("Woof! Hi, I'm {}. Let's chat!", profile.name)
}

/// Build the prompt for a turn.
pub fn build_prompt(profile: &DogProfile, context: PromptContext<'_>) -> String {
    match context {
        PromptContext::Greeting => roleplay_prompt(profile, &greeting_seed(profile)),
        PromptContext::Reply(input) => roleplay_prompt(profile, input),
        PromptContext::Photo(image_data) => photo_prompt(profile, image_data),
    }
}

fn roleplay_prompt(profile: &DogProfile, input: &str) -> String {
    format!(
        "You are a dog named {name}. You are a {breed} and {age} years old. \
         Your personality traits are {traits}. \
         Your favorite activity is {activity} and your favorite treat is {treat}. \
         Respond to the following message from your owner in a playful, dog-like manner: \"{input}\"",
        name = profile.name,
        breed = profile.breed,
        age = profile.age,
        traits = profile.personality_list(),
        activity = profile.favorite_activity,
        treat = profile.favorite_treat,
        input = input,
    )
}

fn photo_prompt(profile: &DogProfile, image_data: &str) -> String {
    format!(
        "You are an AI trained to analyze dog emotions and behavior in images. \
         Analyze this image of a dog and describe what you see, focusing on the dog's emotions, \
         body language, and any notable elements in the surroundings. \
         Then, roleplay as {name}, a {breed} dog with the following personality traits: {traits}. \
         Respond as if you are the dog in the photo, expressing how you feel and what you're \
         thinking based on the analysis. Keep the response playful and dog-like.\n\n\
         {marker}\n{data}",
        name = profile.name,
        breed = profile.breed,
        traits = profile.personality_list(),
        marker = IMAGE_MARKER,
        data = image_data,
    )
}

/// Split a prompt into its text and an optional inline image payload.
///
/// The payload is whatever follows the last line holding only
/// [`IMAGE_MARKER`], and only counts as an image if it is valid base64
/// (optionally as a `data:` URL). Anything else is plain text.
pub fn split_image_payload(prompt: &str) -> (&str, Option<&str>) {
    let marker_line = format!("\n{}\n", IMAGE_MARKER);
    let leading = format!("{}\n", IMAGE_MARKER);

    let (text, data) = if let Some(pos) = prompt.rfind(&marker_line) {
        (&prompt[..pos], &prompt[pos + marker_line.len()..])
    } else if let Some(rest) = prompt.strip_prefix(&leading) {
        ("", rest)
    } else {
        return (prompt, None);
    };

    let data = data.trim();
    if !is_image_payload(data) {
        return (prompt, None);
    }
    (text.trim_end(), Some(data))
}

fn is_image_payload(data: &str) -> bool {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, payload)) => payload,
            None => return false,
        },
        None => data,
    };
    !encoded.is_empty() && BASE64_STANDARD.decode(encoded).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rex() -> DogProfile {
        let mut profile = DogProfile::new("Rex", "Labrador");
        profile.age = "3".to_string();
        profile.personality = vec!["Playful".to_string(), "Friendly".to_string()];
        profile.favorite_activity = "Playing fetch".to_string();
        profile.favorite_treat = "Bacon".to_string();
        profile
    }

    #[test]
    fn test_reply_prompt_text() {
        let prompt = build_prompt(&rex(), PromptContext::Reply("Are you hungry?"));
        assert_eq!(
            prompt,
            "You are a dog named Rex. You are a Labrador and 3 years old. \
             Your personality traits are Playful, Friendly. \
             Your favorite activity is Playing fetch and your favorite treat is Bacon. \
             Respond to the following message from your owner in a playful, dog-like manner: \
             \"Are you hungry?\""
        );
    }

    #[test]
    fn test_greeting_uses_seed() {
        let prompt = build_prompt(&rex(), PromptContext::Greeting);
        assert!(prompt.ends_with("\"Woof! Hi, I'm Rex. Let's chat!\""));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let profile = rex();
        for context in [
            PromptContext::Greeting,
            PromptContext::Reply("  spaced  input "),
            PromptContext::Photo("aGVsbG8="),
        ] {
            assert_eq!(build_prompt(&profile, context), build_prompt(&profile.clone(), context));
        }
    }

    #[test]
    fn test_photo_prompt_embeds_payload() {
        let prompt = build_prompt(&rex(), PromptContext::Photo("aGVsbG8="));
        assert!(prompt.contains("roleplay as Rex, a Labrador dog"));
        assert!(prompt.contains("personality traits: Playful, Friendly."));
        assert!(prompt.ends_with("\n\n[IMAGE]\naGVsbG8="));

        let (text, data) = split_image_payload(&prompt);
        assert!(text.ends_with("Keep the response playful and dog-like."));
        assert_eq!(data, Some("aGVsbG8="));
    }

    #[test]
    fn test_split_without_marker() {
        let (text, data) = split_image_payload("just words about [IMAGE] inline");
        assert_eq!(text, "just words about [IMAGE] inline");
        assert_eq!(data, None);

        assert_eq!(split_image_payload("[IMAGE]\nZm9v"), ("", Some("Zm9v")));
        assert_eq!(
            split_image_payload("look\n[IMAGE]\n   "),
            ("look\n[IMAGE]\n   ", None)
        );
    }

    #[test]
    fn test_marker_typed_in_text_stays_text() {
        let prompt = build_prompt(&rex(), PromptContext::Reply("look\n[IMAGE]\nZm9v"));
        assert_eq!(split_image_payload(&prompt), (prompt.as_str(), None));

        let prompt = build_prompt(&rex(), PromptContext::Reply("[IMAGE]\nnot base64!"));
        assert_eq!(split_image_payload(&prompt).1, None);
    }

    #[test]
    fn test_split_uses_last_marker() {
        let prompt = "caption\n[IMAGE]\nwords\n[IMAGE]\naGVsbG8=";
        assert_eq!(
            split_image_payload(prompt),
            ("caption\n[IMAGE]\nwords", Some("aGVsbG8="))
        );
        assert_eq!(
            split_image_payload("x\n[IMAGE]\ndata:image/png;base64,aGk=").1,
            Some("data:image/png;base64,aGk=")
        );
    }
}
