use lazy_static::lazy_static;
use regex::Regex;

/// Classification of one user message. Both flags may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub solve_intent: bool,
    pub reveal_intent: bool,
}

lazy_static! {
    // "do it for me" imperatives
    static ref SOLVE_RE: Regex = Regex::new(
        r"(?i)(vyrieš|vypočítaj|vyrataj|urob to za mňa|sprav to za mňa|napíš to za mňa|sprav mi to|vyplň to)"
    )
    .unwrap();

    // "show me the final answer" requests
    static ref REVEAL_RE: Regex = Regex::new(
        r"(?i)(ukáž (mi )?(odpoveď|riešenie|výsledok)|povedz (mi )?(odpoveď|výsledok)|chcem (výsledok|odpoveď|riešenie)|daj (mi )?hotové|hotové riešenie|daj (mi )?(odpoveď|riešenie|výsledok)|aká je( správna)? odpoveď|aký je výsledok)"
    )
    .unwrap();

    // Phrases the model uses to announce a finished solution
    static ref LEAK_CUE_RE: Regex = Regex::new(
        r"(?i)(výsledok je|odpoveď je|hotové riešenie|riešenie je|správna odpoveď je|vychádza nám|celé riešenie)"
    )
    .unwrap();

    // Numbered, lettered or bulleted list line
    static ref ENUMERATED_LINE_RE: Regex =
        Regex::new(r"^\s*(\d+[.)]|[a-zA-Z][.)]|[-*•])\s+").unwrap();
}

/// Canned Socratic replacement used when a hint-intended reply leaked a
/// full solution. Ends in exactly one question, like a proper hint.
pub const LEAK_FALLBACK: &str = "Poďme na to radšej spolu, krok za krokom. \
Skús mi najprv napísať, čo zo zadania už vieš a kde si sa zasekol. \
Ktorým prvým krokom by si začal?";

pub fn classify(text: &str) -> Intents {
    Intents {
        solve_intent: SOLVE_RE.is_match(text),
        reveal_intent: REVEAL_RE.is_match(text),
    }
}

/// Heuristic leak check for replies that were meant to be a hint or a
/// check-in. Cue phrase, or four+ enumerated lines (catches step-by-step
/// solutions that never say "the answer is").
pub fn leaks_solution(reply: &str) -> bool {
    if LEAK_CUE_RE.is_match(reply) {
        return true;
    }

    let enumerated = reply
        .lines()
        .filter(|line| ENUMERATED_LINE_RE.is_match(line))
        .count();

    enumerated >= 4
}
