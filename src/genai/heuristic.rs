//! Contextual heuristic generator: the offline, final stage of the fallback
//! chain. Classifies a prompt into themes via a declarative keyword table,
//! then selects from theme-specific template pools via a separate priority
//! cascade. Classification is deterministic; only the pick within the
//! matched pool is randomized. Never calls out, never fails, never empty.

use rand::Rng;

use super::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    LifeEvent,
    Romantic,
    Friendship,
    Family,
    Joy,
    Love,
    Nostalgia,
    Celebration,
    Travel,
    Food,
    Nature,
    Achievement,
    Growth,
    Moment,
    Season,
    Flowers,
    Work,
    Health,
}

/// Theme -> keyword table. A theme matches when any of its keywords occurs
/// in the lower-cased prompt; multiple themes may match at once.
const THEME_KEYWORDS: &[(Theme, &[&str])] = &[
    (
        Theme::LifeEvent,
        &[
            "turning point",
            "special day",
            "milestone",
            "important day",
            "significant",
            "life changing",
            "new chapter",
            "new beginning",
        ],
    ),
    (
        Theme::Romantic,
        &[
            "love of my life",
            "soulmate",
            "true love",
            "romantic",
            "boyfriend",
            "girlfriend",
            "husband",
            "wife",
            "partner",
            "relationship",
        ],
    ),
    (
        Theme::Friendship,
        &["friend", "friendship", "buddy", "companion", "mate"],
    ),
    (
        Theme::Family,
        &[
            "family", "parent", "child", "baby", "son", "daughter", "mother", "father", "sister",
            "brother",
        ],
    ),
    (
        Theme::Joy,
        &[
            "happy", "joy", "excited", "thrilled", "elated", "blessed", "grateful", "wonderful",
            "amazing",
        ],
    ),
    (
        Theme::Love,
        &[
            "love", "adore", "cherish", "treasure", "precious", "special", "meaningful",
        ],
    ),
    (
        Theme::Nostalgia,
        &["memory", "remember", "recall", "nostalgic", "past", "childhood"],
    ),
    (
        Theme::Celebration,
        &[
            "celebration",
            "party",
            "birthday",
            "anniversary",
            "wedding",
            "graduation",
        ],
    ),
    (
        Theme::Travel,
        &[
            "travel",
            "trip",
            "vacation",
            "journey",
            "adventure",
            "explore",
            "visit",
            "destination",
        ],
    ),
    (
        Theme::Food,
        &[
            "food",
            "meal",
            "dinner",
            "lunch",
            "breakfast",
            "cooking",
            "restaurant",
            "delicious",
        ],
    ),
    (
        Theme::Nature,
        &[
            "nature", "outdoor", "sunset", "sunrise", "mountain", "ocean", "beach", "forest",
            "garden",
        ],
    ),
    (
        Theme::Achievement,
        &[
            "achievement",
            "success",
            "accomplishment",
            "goal",
            "dream",
            "aspiration",
            "ambition",
        ],
    ),
    (
        Theme::Growth,
        &[
            "growth",
            "development",
            "progress",
            "improvement",
            "learning",
            "experience",
        ],
    ),
    (
        Theme::Moment,
        &["moment", "time", "night", "morning", "evening", "afternoon"],
    ),
    (
        Theme::Season,
        &["spring", "summer", "autumn", "winter", "seasonal"],
    ),
    (
        Theme::Flowers,
        &["flower", "rose", "bouquet", "gift", "present", "surprise"],
    ),
    (
        Theme::Work,
        &["work", "job", "career", "office", "business", "meeting"],
    ),
    (
        Theme::Health,
        &[
            "health",
            "fitness",
            "exercise",
            "wellness",
            "meditation",
            "yoga",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Joy,
    Love,
    Nostalgia,
    Appreciation,
}

impl Emotion {
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Love => "love",
            Emotion::Nostalgia => "nostalgia",
            Emotion::Appreciation => "appreciation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    LifeEvent,
    Romantic,
    Achievement,
    General,
}

/// Result of classifying a prompt. Same prompt, same classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub themes: Vec<Theme>,
    pub primary_emotion: Emotion,
    pub primary_context: Context,
}

impl Classification {
    pub fn has(&self, theme: Theme) -> bool {
        self.themes.contains(&theme)
    }
}

/// Match the lower-cased prompt against the keyword table and resolve the
/// primary emotion and context by fixed priority.
pub fn classify(prompt: &str) -> Classification {
    let lower = prompt.to_lowercase();

    let themes: Vec<Theme> = THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(theme, _)| *theme)
        .collect();

    let has = |t: Theme| themes.contains(&t);

    let primary_emotion = if has(Theme::Joy) {
        Emotion::Joy
    } else if has(Theme::Love) {
        Emotion::Love
    } else if has(Theme::Nostalgia) {
        Emotion::Nostalgia
    } else {
        Emotion::Appreciation
    };

    let primary_context = if has(Theme::LifeEvent) {
        Context::LifeEvent
    } else if has(Theme::Romantic) {
        Context::Romantic
    } else if has(Theme::Achievement) {
        Context::Achievement
    } else {
        Context::General
    };

    Classification {
        themes,
        primary_emotion,
        primary_context,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Caption,
    Description,
}

/// A pool of templates selected when all `required` themes match. Rules are
/// checked in order; the first match wins, so more specific combinations
/// shadow their components.
struct PoolRule {
    required: &'static [Theme],
    captions: &'static [&'static str],
    descriptions: &'static [&'static str],
}

const POOL_RULES: &[PoolRule] = &[
    PoolRule {
        required: &[Theme::LifeEvent, Theme::Romantic],
        captions: &[
            "A turning point of love",
            "The day love changed everything",
            "When life and love aligned",
            "A milestone of the heart",
            "The beginning of forever",
        ],
        descriptions: &[
            "This moment represents a turning point in my life, the day I found the love of my life. Every detail of this day is etched in my memory, from the way the light fell to the emotions that filled my heart. It marks the beginning of a new chapter filled with love and possibility. It captures what it means to find your person, the moment when life and love align.",
            "A turning point often comes when you least expect it, and this day was exactly that for me. Finding the love of my life changed my world in the most beautiful ways. Every element of this memory tells a story of transformation. It holds the joy and gratitude that come with finding your true love.",
            "Some days are so significant that they become the foundation of your entire story, and this is one of them. Meeting the love of my life redefined everything I thought I knew about happiness. This memory preserves the magic of that turning point. It is the exact moment my life took on new meaning.",
        ],
    },
    PoolRule {
        required: &[Theme::Romantic, Theme::Flowers],
        captions: &[
            "Love blooms in petals",
            "Flowers speak of love",
            "A bouquet of affection",
            "Petals of romance",
            "Love in bloom",
        ],
        descriptions: &[
            "These flowers are more than beautiful petals; they carry the thoughtfulness of the person who gave them to me. Each bloom tells a story of care, each color speaks of feelings words cannot quite hold. The small gestures are the ones that carry the most weight. They remind me how gentle and quiet love can be.",
            "In this moment, love takes a tangible form. Each petal seems to whisper a message of affection, each stem a testament to someone's thoughtfulness. Receiving them felt like being seen completely. This memory keeps that warmth close, long after the flowers themselves have faded.",
            "Flowers have a language of their own, and these blooms say everything about the care that went into choosing them. It is not really about the flowers at all. It is about feeling appreciated and loved in the simplest possible way. The colors and the fragrance bring the whole day back to me.",
        ],
    },
    PoolRule {
        required: &[Theme::Romantic],
        captions: &[
            "Love of my life",
            "My soulmate found",
            "True love captured",
            "Heart's greatest joy",
            "My forever person",
        ],
        descriptions: &[
            "Finding the love of my life has been the most transformative part of my journey. This moment captures what it means to know someone who understands your soul and brings out the best in you. The connection we share has changed the way I see the world. This memory preserves the feeling of being truly seen and loved for who I am.",
            "Love has a way of finding us when we least expect it, and this moment holds the beauty of that discovery. The love of my life has brought colors to my world I never knew existed. Every day since has been filled with laughter and possibility. Every detail here speaks of the bond we share and the future we are building.",
            "Some people come into your life and change everything, and that is exactly what happened here. This moment holds the joy and gratitude of finding someone who makes your heart sing. What we share is built on understanding and a deep appreciation for each other. It feels like being home.",
        ],
    },
    PoolRule {
        required: &[Theme::LifeEvent],
        captions: &[
            "A turning point in life",
            "A new chapter begins",
            "The day everything changed",
            "A milestone reached",
            "Life's defining moment",
        ],
        descriptions: &[
            "This moment represents a turning point, a day that changed everything and set me on a new path. Every detail is etched in my memory, from the emotions that filled my heart to the people who shared it with me. It marks the beginning of a new chapter. It reminds me that I am becoming the person I was meant to be.",
            "Life has a way of presenting moments that become the foundation of our story, and this is one of them. This turning point was not just about change; it was about transformation. It shifted my perspective and gave me the courage to embrace the unknown. I still feel like I am standing at the threshold of something beautiful.",
            "Some days become the markers of our personal evolution, and this is one of those days. This turning point was less about what happened and more about who I became because of it. Every element of this memory tells a story of growth. It is proof that the defining moments are worth embracing.",
        ],
    },
    PoolRule {
        required: &[Theme::Achievement],
        captions: &[
            "Dreams becoming reality",
            "Success captured in time",
            "A moment of triumph",
            "Goals reached, dreams fulfilled",
            "Achievement celebrated",
        ],
        descriptions: &[
            "This moment holds the weight of every early morning and every small step that led here. Reaching this goal did not happen all at once; it happened slowly, and then suddenly. I want to remember exactly how this felt. The pride, the relief, and the quiet certainty that the work was worth it.",
            "Success rarely looks the way you imagine it, and this moment taught me that. It is quieter, more personal, and far more meaningful. This memory holds the culmination of something I once only dreamed about. It reminds me that persistence carries you further than talent ever could.",
            "There is a particular kind of happiness in watching a long effort finally come together. This moment captures it completely. Everything that seemed uncertain along the way now makes sense in hindsight. I will come back to this memory whenever the next goal feels too far away.",
        ],
    },
    PoolRule {
        required: &[Theme::Celebration],
        captions: &[
            "Celebrating life's moments",
            "Joy fills the air",
            "A day to remember",
            "Festive spirits high",
            "Happy memories made",
        ],
        descriptions: &[
            "Days like this one are why we gather the people we love and mark the occasion. The laughter, the noise, and the warmth of familiar faces made every minute count. Celebrations pass quickly, but the feeling of them lingers. This memory keeps that feeling within reach.",
            "There was joy in the air from the first moment, the kind that is impossible to manufacture. Everyone who mattered was there, and everything else fell away. I remember the toasts, the music, and the sense that time had slowed down for us. These are the days that make all the ordinary ones worthwhile.",
            "Some celebrations are about the event, and some are about the people, and this one was entirely about the people. Being surrounded by so much affection made the day feel effortless. Every photo from it brings the sounds and the laughter straight back. I am grateful it happened and grateful it was captured.",
        ],
    },
];

fn pick(pool: &[&'static str]) -> &'static str {
    pool[rand::rng().random_range(0..pool.len())]
}

/// Generate a single text in the given mode. The public single-output
/// contract; `generate` composes both modes into a candidate.
pub fn generate_text(prompt: &str, mode: Mode) -> String {
    let classification = classify(prompt);
    let rule = POOL_RULES
        .iter()
        .find(|rule| rule.required.iter().all(|t| classification.has(*t)));

    match (rule, mode) {
        (Some(rule), Mode::Caption) => pick(rule.captions).to_string(),
        (Some(rule), Mode::Description) => pick(rule.descriptions).to_string(),
        (None, Mode::Caption) => generic_caption(classification.primary_emotion),
        (None, Mode::Description) => generic_description(classification.primary_emotion),
    }
}

pub fn generate_caption(prompt: &str) -> String {
    generate_text(prompt, Mode::Caption)
}

pub fn generate_description(prompt: &str) -> String {
    generate_text(prompt, Mode::Description)
}

/// Generate a full caption/description pair for a prompt.
pub fn generate(prompt: &str) -> Candidate {
    Candidate {
        caption: generate_caption(prompt),
        description: generate_description(prompt),
    }
}

/// Generic pool parameterized by the primary emotion, used when no theme
/// combination matches.
fn generic_caption(emotion: Emotion) -> String {
    let emotion = emotion.label();
    let templates = [
        format!("A moment of {emotion}"),
        format!("Pure {emotion}, kept close"),
        format!("{emotion} captured in time"),
        format!("{emotion} in every detail"),
        format!("A memory full of {emotion}"),
    ];
    let choice = &templates[rand::rng().random_range(0..templates.len())];
    super::capitalize_first(choice)
}

fn generic_description(emotion: Emotion) -> String {
    let emotion = emotion.label();
    let templates = [
        format!(
            "This moment holds a special place in my heart, filled with {emotion} and meaning that goes beyond words. Every detail tells a story, and every element adds to a memory I will keep for years. It speaks to what makes life beautiful. The connections we make and the moments we share shape who we become."
        ),
        format!(
            "In this moment I feel a deep sense of {emotion}, the kind that reminds me of what truly matters. The world seemed to slow down, letting me savor every second. There was a quiet joy in the air, a sense that everything was just as it should be. Every glance at this brings the warmth of it back."
        ),
        format!(
            "Some moments deserve to be remembered forever, and this is one of them. The {emotion} that fills this memory makes it feel almost weightless. It captures the connections and the small details that make a day matter. It reminds me that the most precious moments are often the quietest ones."
        ),
    ];
    templates[rand::rng().random_range(0..templates.len())].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::{is_valid_caption, is_valid_description};

    #[test]
    fn classification_is_deterministic() {
        let prompt = "our wedding anniversary trip to the mountains";
        let a = classify(prompt);
        let b = classify(prompt);
        assert_eq!(a, b);
        assert!(a.has(Theme::Celebration));
        assert!(a.has(Theme::Travel));
        assert!(a.has(Theme::Nature));
    }

    #[test]
    fn multiple_themes_match_simultaneously() {
        let c = classify("a milestone day with the love of my life");
        assert!(c.has(Theme::LifeEvent));
        assert!(c.has(Theme::Romantic));
        assert!(c.has(Theme::Love));
    }

    #[test]
    fn emotion_priority_joy_over_love() {
        let c = classify("so happy and in love");
        assert_eq!(c.primary_emotion, Emotion::Joy);
        let c = classify("a love I treasure");
        assert_eq!(c.primary_emotion, Emotion::Love);
        let c = classify("a childhood memory");
        assert_eq!(c.primary_emotion, Emotion::Nostalgia);
        let c = classify("dinner on the terrace");
        assert_eq!(c.primary_emotion, Emotion::Appreciation);
    }

    #[test]
    fn context_priority_life_event_first() {
        let c = classify("a life changing romantic success");
        assert_eq!(c.primary_context, Context::LifeEvent);
        let c = classify("a romantic success");
        assert_eq!(c.primary_context, Context::Romantic);
        let c = classify("a hard-won success");
        assert_eq!(c.primary_context, Context::Achievement);
        let c = classify("breakfast outside");
        assert_eq!(c.primary_context, Context::General);
    }

    #[test]
    fn wedding_prompts_draw_from_celebration_pool() {
        let rule = POOL_RULES
            .iter()
            .find(|r| r.required == [Theme::Celebration])
            .unwrap();
        for _ in 0..20 {
            let caption = generate_caption("wedding");
            assert!(
                rule.captions.contains(&caption.as_str()),
                "caption {:?} not in celebration pool",
                caption
            );
        }
    }

    #[test]
    fn combination_shadows_single_theme() {
        // life-event + romantic must win over the plain romantic pool
        let combined = &POOL_RULES[0];
        assert_eq!(combined.required, [Theme::LifeEvent, Theme::Romantic]);
        for _ in 0..20 {
            let caption = generate_caption("a turning point with my soulmate");
            assert!(combined.captions.contains(&caption.as_str()));
        }
    }

    #[test]
    fn output_is_always_valid() {
        let prompts = [
            "wedding",
            "",
            "x",
            "an unremarkable tuesday",
            "my graduation and my first job on the same day",
        ];
        for prompt in prompts {
            let candidate = generate(prompt);
            assert!(
                is_valid_caption(&candidate.caption),
                "prompt {:?} caption {:?}",
                prompt,
                candidate.caption
            );
            assert!(is_valid_description(&candidate.description));
            assert!(candidate.caption.chars().next().unwrap().is_uppercase());
            // multi-sentence paragraph
            assert!(candidate.description.matches('.').count() >= 3);
        }
    }

    #[test]
    fn every_pool_string_is_within_bounds() {
        for rule in POOL_RULES {
            for caption in rule.captions {
                assert!(is_valid_caption(caption), "caption {:?}", caption);
                assert!(caption.chars().next().unwrap().is_uppercase());
            }
            for description in rule.descriptions {
                assert!(is_valid_description(description));
                assert!(description.matches('.').count() >= 3);
            }
        }
    }
}
