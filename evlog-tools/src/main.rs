//! Основные функции
//!
//! - `i <file>` сводка по файлу: кол-во записей, коррекции порядка, причина остановки
//! - `v <file> <start> <end>` вывод записей из диапазона
//! - `g <file> <count>` создание синтетического потока

mod actions;
mod err;

use std::{env, io};

use err::ToolErr;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    for action in parse_args(&args).into_iter() {
        match action.execute() {
            Ok(_) => {}
            Err(err) => {
                log::error!("execute {action:?} failed with {err}")
            }
        }
    }
}

fn parse_args(args: &[String]) -> Vec<Action> {
    let mut actions = Vec::<Action>::new();

    let mut itr = args.iter();
    itr.next(); // skip exe

    let mut state = "state";
    let mut file: Option<String> = None;
    let mut start: u64 = 0;

    for arg in itr {
        match state {
            "state" => match arg.as_str() {
                "i" => state = "info",
                "v" => state = "view",
                "g" => state = "generate",
                _ => log::warn!("undefined arg {arg}"),
            },
            "info" => {
                state = "state";
                actions.push(Action::Info { file: arg.clone() })
            }
            "view" => {
                file = Some(arg.clone());
                state = "view_start"
            }
            "view_start" => match arg.parse::<u64>() {
                Ok(v) => {
                    start = v;
                    state = "view_end"
                }
                Err(err) => {
                    log::warn!("bad start '{arg}': {err}");
                    state = "state"
                }
            },
            "view_end" => {
                state = "state";
                match (file.take(), arg.parse::<u64>()) {
                    (Some(file), Ok(end)) => actions.push(Action::View { file, start, end }),
                    (_, Err(err)) => log::warn!("bad end '{arg}': {err}"),
                    (None, _) => {}
                }
            }
            "generate" => {
                file = Some(arg.clone());
                state = "generate_count"
            }
            "generate_count" => {
                state = "state";
                match (file.take(), arg.parse::<usize>()) {
                    (Some(file), Ok(count)) => actions.push(Action::Generate { file, count }),
                    (_, Err(err)) => log::warn!("bad count '{arg}': {err}"),
                    (None, _) => {}
                }
            }
            _ => {}
        }
    }

    actions
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Info { file: String },
    View { file: String, start: u64, end: u64 },
    Generate { file: String, count: usize },
}

impl Action {
    fn execute(&self) -> Result<(), ToolErr> {
        match self {
            Action::Info { file } => actions::info::view_info(file, &mut io::stdout().lock()),
            Action::View { file, start, end } => actions::view::view_range(file, *start, *end, &mut io::stdout().lock()),
            Action::Generate { file, count } => {
                actions::generate::generate_file(file, *count, &mut rand::thread_rng())?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn args(line: &str) -> Vec<String> {
        line.split(' ').map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_actions() {
        let actions = parse_args(&args("evlog-tools g a.bin 100 i a.bin v a.bin 5 10 x"));
        assert_eq!(
            actions,
            vec![
                Action::Generate { file: "a.bin".to_string(), count: 100 },
                Action::Info { file: "a.bin".to_string() },
                Action::View { file: "a.bin".to_string(), start: 5, end: 10 },
            ]
        );
    }

    #[test]
    fn parse_skips_bad_numbers() {
        let actions = parse_args(&args("evlog-tools v a.bin five 10 g b.bin many i c.bin"));
        assert_eq!(actions, vec![Action::Info { file: "c.bin".to_string() }]);
    }

    #[test]
    fn generate_then_view() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("stream.bin");

        let mut rng = StdRng::seed_from_u64(1);
        let bytes = actions::generate::generate_file(&file, 120, &mut rng).unwrap();
        assert!(bytes > 120);

        let mut out = Vec::<u8>::new();
        actions::info::view_info(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("records     120"));
        assert!(text.contains("end         eof"));

        let mut out = Vec::<u8>::new();
        actions::view::view_range(&file, 10, 15, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 5);

        let mut out = Vec::<u8>::new();
        actions::view::view_range(&file, 500, 510, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("no records"));
    }
}
