use crate::models::tutor::{ResponseType, Role};

/// Renders the system instruction for one tutoring turn. Trusted server-side
/// template, inputs are interpolated as-is.
pub fn build_system_prompt(role: Role, response: ResponseType, step: u8, attempts: u8) -> String {
    let mut prompt = String::from(
        "Si Sovka, kamarátsky AI tútor pre deti na základnej škole. \
         Odpovedáš vždy po slovensky, krátko, povzbudivo a trpezlivo. \
         Nikdy sa dieťaťu nevysmievaš.\n",
    );

    prompt.push_str(&format!(
        "REŽIM ODPOVEDE: {}\nKrok rebríka nápovied: {} z 3\nDoterajšie pokusy: {}\n",
        response.prompt_token(),
        step,
        attempts
    ));

    match response {
        ResponseType::Hint => prompt.push_str(
            "Pravidlá pre HINT: Neprezraď výsledok ani celý postup. \
             Ponúkni jednu stratégiu alebo nasmerovanie na ďalší krok. \
             Odpoveď ukonči presne jednou otázkou pre dieťa.\n",
        ),
        ResponseType::Check => prompt.push_str(
            "Pravidlá pre CHECK: Neprezraď výsledok. Požiadaj dieťa, aby \
             úlohu skúsilo vyriešiť samo a napísalo ti svoj postup alebo \
             medzivýsledok. Odpoveď ukonči presne jednou otázkou.\n",
        ),
        ResponseType::Reveal => prompt.push_str(
            "Pravidlá pre REVEAL: Uveď finálnu odpoveď a pridaj stručné \
             vysvetlenie, najviac 3 riadky.\n",
        ),
    }

    if role != Role::Kid {
        prompt.push_str(
            "Používateľ je dospelý (rodič, učiteľ alebo vývojár); priame \
             vyriešenie úlohy je povolené.\n",
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_uppercased_response_token() {
        let p = build_system_prompt(Role::Kid, ResponseType::Hint, 2, 1);
        assert!(p.contains("REŽIM ODPOVEDE: HINT"));
        assert!(p.contains("Krok rebríka nápovied: 2 z 3"));
        assert!(p.contains("Doterajšie pokusy: 1"));
    }

    #[test]
    fn test_hint_prompt_forbids_revealing() {
        let p = build_system_prompt(Role::Kid, ResponseType::Hint, 1, 0);
        assert!(p.contains("Neprezraď výsledok"));
        assert!(p.contains("jednou otázkou"));
    }

    #[test]
    fn test_reveal_prompt_limits_explanation() {
        let p = build_system_prompt(Role::Kid, ResponseType::Reveal, 3, 2);
        assert!(p.contains("REVEAL"));
        assert!(p.contains("najviac 3 riadky"));
    }

    #[test]
    fn test_adult_roles_permit_direct_solving() {
        let p = build_system_prompt(Role::Teacher, ResponseType::Reveal, 1, 0);
        assert!(p.contains("priame"));

        let kid = build_system_prompt(Role::Kid, ResponseType::Hint, 1, 0);
        assert!(!kid.contains("dospelý"));
    }
}
