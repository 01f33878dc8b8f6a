/*!
 * Program Loader
 * Parses the textual program-definition format into instruction lists
 */

use crate::core::errors::LoadError;
use crate::process::Instruction;
use log::info;
use std::path::Path;

/// One parsed process definition, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

/// Load and parse a program file.
///
/// Format, one item per line:
/// ```text
/// # comment
/// program P1
/// resource(1, allocate)
/// wait(2)
/// end
/// ```
pub fn load_programs(path: impl AsRef<Path>) -> Result<Vec<Program>, LoadError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    let programs = parse(&source)?;
    info!(
        "loaded {} programs from {}",
        programs.len(),
        path.as_ref().display()
    );
    Ok(programs)
}

/// Parse program definitions from text. Blank lines and `#` comments are
/// skipped; legacy `for`/`next` loop markers are ignored.
pub fn parse(source: &str) -> Result<Vec<Program>, LoadError> {
    let mut programs: Vec<Program> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        if let Some(rest) = text.strip_prefix("program") {
            let name = rest.trim();
            if name.is_empty() {
                return Err(LoadError::UnknownInstruction {
                    line,
                    text: text.into(),
                });
            }
            if programs.iter().any(|p| p.name == name) {
                return Err(LoadError::DuplicateProgram {
                    line,
                    name: name.into(),
                });
            }
            programs.push(Program {
                name: name.into(),
                instructions: Vec::new(),
            });
            continue;
        }

        let instruction = parse_instruction(text, line)?;
        match programs.last_mut() {
            Some(program) => {
                if let Some(instruction) = instruction {
                    program.instructions.push(instruction);
                }
            }
            None => {
                return Err(LoadError::MissingHeader {
                    line,
                    text: text.into(),
                })
            }
        }
    }

    Ok(programs)
}

/// `Ok(None)` for lines that are valid but carry no instruction
fn parse_instruction(text: &str, line: usize) -> Result<Option<Instruction>, LoadError> {
    if text == "end" {
        return Ok(Some(Instruction::End));
    }
    if text.starts_with("for") || text.starts_with("next") {
        return Ok(None);
    }

    if let Some(args) = argument_list(text, "wait") {
        let ticks = args.trim().parse().map_err(|_| LoadError::InvalidNumber {
            line,
            text: text.into(),
        })?;
        return Ok(Some(Instruction::Wait(ticks)));
    }

    if let Some(args) = argument_list(text, "resource") {
        let (id, op) = args.split_once(',').ok_or_else(|| LoadError::UnknownInstruction {
            line,
            text: text.into(),
        })?;
        let resource = id.trim().parse().map_err(|_| LoadError::InvalidNumber {
            line,
            text: text.into(),
        })?;
        let op = op.trim();
        if op != "allocate" {
            return Err(LoadError::UnsupportedOperation {
                line,
                op: op.into(),
            });
        }
        return Ok(Some(Instruction::Request(resource)));
    }

    Err(LoadError::UnknownInstruction {
        line,
        text: text.into(),
    })
}

/// Strip `keyword(` ... `)` and return the raw argument text
fn argument_list<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    text.strip_prefix(keyword)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_two_programs() {
        let source = "\
# classic deadlock pair
program P1
resource(1, allocate)
wait(2)
resource(2, allocate)
end

program P2
resource(2, allocate)
wait(1)
resource(1, allocate)
end
";
        let programs = parse(source).unwrap();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].name, "P1");
        assert_eq!(
            programs[0].instructions,
            vec![
                Instruction::Request(1),
                Instruction::Wait(2),
                Instruction::Request(2),
                Instruction::End,
            ]
        );
        assert_eq!(programs[1].instructions.len(), 4);
    }

    #[test]
    fn test_loop_markers_are_ignored() {
        let source = "program P1\nfor i = 1 to 3\nwait(1)\nnext i\nend\n";
        let programs = parse(source).unwrap();
        assert_eq!(
            programs[0].instructions,
            vec![Instruction::Wait(1), Instruction::End]
        );
    }

    #[test]
    fn test_instruction_before_header() {
        let err = parse("wait(1)\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader { line: 1, .. }));
    }

    #[test]
    fn test_unknown_instruction() {
        let err = parse("program P1\nspin(3)\n").unwrap_err();
        assert!(matches!(err, LoadError::UnknownInstruction { line: 2, .. }));
    }

    #[test]
    fn test_bad_wait_duration() {
        let err = parse("program P1\nwait(soon)\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn test_unsupported_resource_operation() {
        let err = parse("program P1\nresource(1, release)\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnsupportedOperation { line: 2, ref op } if op == "release"
        ));
    }

    #[test]
    fn test_duplicate_program_name() {
        let err = parse("program P1\nend\nprogram P1\nend\n").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateProgram { line: 3, .. }));
    }
}
