// src/command.rs

use crate::{
    event::Event,
    models::{
        auth::{JoinForm, LoginForm},
        question::OptionKey,
    },
};

/// Parses one line typed into the console client.
///
/// * `login <email|id> <password>`, or `login <password>` for the last identifier
/// * `join <session-id> <otp> <enrollment> <full name...>`; an enrollment of
///   `-` falls back to the login identifier
/// * `a`..`d` or `answer <a-d>`, `next`/`right`, `prev`/`left`
/// * `submit`, `leave`, `back`, `exit`, `quit`
pub fn parse_command(line: &str) -> Result<Event, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = words.collect();

    match verb.to_ascii_lowercase().as_str() {
        "login" => match rest.as_slice() {
            [identifier, password] => Ok(Event::Login(LoginForm::new(identifier, password))),
            [password] => Ok(Event::Login(LoginForm::new("", password))),
            _ => Err("usage: login [email|id] <password>".to_string()),
        },
        "join" => match rest.as_slice() {
            [session_id, otp, enrollment, name @ ..] if !name.is_empty() => {
                let enrollment = if *enrollment == "-" { "" } else { *enrollment };
                Ok(Event::Join(JoinForm::new(
                    &name.join(" "),
                    enrollment,
                    session_id,
                    otp,
                )))
            }
            _ => Err("usage: join <session-id> <otp> <enrollment|-> <full name>".to_string()),
        },
        "a" | "b" | "c" | "d" if rest.is_empty() => verb.parse::<OptionKey>().map(Event::Select),
        "answer" => match rest.as_slice() {
            [choice] => choice.parse::<OptionKey>().map(Event::Select),
            _ => Err("usage: answer <a|b|c|d>".to_string()),
        },
        "next" | "n" | "right" => Ok(Event::Next),
        "prev" | "p" | "left" => Ok(Event::Previous),
        "submit" => Ok(Event::Submit),
        "leave" => Ok(Event::Leave),
        "back" => Ok(Event::BackToLogin),
        "exit" => Ok(Event::Exit),
        "quit" => Ok(Event::Shutdown),
        other => Err(format!("unknown command '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_keeps_multi_word_name() {
        let Ok(Event::Join(form)) = parse_command("join 12 AB12 E123 Asha  Kumari") else {
            panic!("expected join");
        };
        assert_eq!(form.session_id, "12");
        assert_eq!(form.otp, "AB12");
        assert_eq!(form.enrollment, "E123");
        assert_eq!(form.name, "Asha Kumari");
    }

    #[test]
    fn defaults_can_be_left_out() {
        let Ok(Event::Login(form)) = parse_command("login secret1") else {
            panic!("expected login");
        };
        assert!(form.identifier.is_empty());
        assert_eq!(form.password, "secret1");

        let Ok(Event::Join(form)) = parse_command("join 12 AB12 - Asha") else {
            panic!("expected join");
        };
        assert!(form.enrollment.is_empty());
        assert_eq!(form.name, "Asha");
    }

    #[test]
    fn answers_and_navigation() {
        assert!(matches!(parse_command("B"), Ok(Event::Select(OptionKey::B))));
        assert!(matches!(parse_command("answer d"), Ok(Event::Select(OptionKey::D))));
        assert!(matches!(parse_command("right"), Ok(Event::Next)));
        assert!(matches!(parse_command("prev"), Ok(Event::Previous)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_command("").is_err());
        assert!(parse_command("login").is_err());
        assert!(parse_command("login a b c").is_err());
        assert!(parse_command("join 1 2 3").is_err());
        assert!(parse_command("answer e").is_err());
        assert!(parse_command("dance").is_err());
    }
}
