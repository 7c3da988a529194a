//! pyautogui Source Rendering
//!
//! Renders an instruction sequence into the textual export format: a small
//! Python program driving pyautogui, with one statement per instruction.
//! This text is what the shell displays and what gets exported to disk; it
//! is never evaluated by this crate — replay dispatches on the instruction
//! sequence directly.

use super::Instruction;

/// Render instructions as a runnable pyautogui script.
///
/// A leading `Wait` is treated as the startup delay and rendered inside the
/// function header block; every other instruction becomes one statement in
/// `run_automation()`.
pub fn render(instructions: &[Instruction]) -> String {
    let mut lines: Vec<String> = vec![
        "import pyautogui".to_string(),
        "import time".to_string(),
        String::new(),
        "def run_automation():".to_string(),
    ];

    let mut rest = instructions;
    if let Some(Instruction::Wait(delay)) = instructions.first() {
        lines.push(format!("    # Wait {} seconds before starting", delay));
        lines.push(format!("    time.sleep({})", delay));
        lines.push(String::new());
        rest = &instructions[1..];
    }

    for instruction in rest {
        lines.push(format!("    {}", statement(instruction)));
    }

    lines.push(String::new());
    lines.push("run_automation()".to_string());

    lines.join("\n")
}

/// One Python statement for one instruction.
fn statement(instruction: &Instruction) -> String {
    match instruction {
        Instruction::Wait(secs) => format!("time.sleep({})", secs),
        Instruction::KeyDown(key) => format!("pyautogui.keyDown('{}')", key),
        Instruction::KeyUp(key) => format!("pyautogui.keyUp('{}')", key),
        Instruction::MouseDown { button, x, y } => {
            format!("pyautogui.mouseDown(button='{}', x={}, y={})", button, x, y)
        }
        Instruction::MouseUp { button, x, y } => {
            format!("pyautogui.mouseUp(button='{}', x={}, y={})", button, x, y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_script() {
        let instructions = vec![
            Instruction::Wait(2.0),
            Instruction::KeyDown("a".to_string()),
            Instruction::Wait(0.5),
            Instruction::KeyUp("a".to_string()),
        ];

        let expected = "\
import pyautogui
import time

def run_automation():
    # Wait 2 seconds before starting
    time.sleep(2)

    pyautogui.keyDown('a')
    time.sleep(0.5)
    pyautogui.keyUp('a')

run_automation()";

        assert_eq!(render(&instructions), expected);
    }

    #[test]
    fn test_mouse_statements() {
        assert_eq!(
            statement(&Instruction::MouseDown {
                button: "left".to_string(),
                x: 100,
                y: 200,
            }),
            "pyautogui.mouseDown(button='left', x=100, y=200)"
        );
        assert_eq!(
            statement(&Instruction::MouseUp {
                button: "right".to_string(),
                x: 0,
                y: -3,
            }),
            "pyautogui.mouseUp(button='right', x=0, y=-3)"
        );
    }

    #[test]
    fn test_wait_statement_formatting() {
        assert_eq!(statement(&Instruction::Wait(0.123)), "time.sleep(0.123)");
        assert_eq!(statement(&Instruction::Wait(0.0)), "time.sleep(0)");
        assert_eq!(statement(&Instruction::Wait(1.5)), "time.sleep(1.5)");
    }

    #[test]
    fn test_render_without_leading_wait() {
        // Hand-built sequences without a startup wait still render
        let instructions = vec![Instruction::KeyDown("x".to_string())];
        let text = render(&instructions);

        assert!(text.starts_with("import pyautogui"));
        assert!(text.contains("def run_automation():"));
        assert!(text.contains("    pyautogui.keyDown('x')"));
        assert!(!text.contains("before starting"));
    }

    #[test]
    fn test_render_preamble_only() {
        let text = render(&[Instruction::Wait(2.0)]);
        assert!(text.contains("# Wait 2 seconds before starting"));
        assert!(text.contains("time.sleep(2)"));
        assert!(text.ends_with("run_automation()"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let instructions = vec![
            Instruction::Wait(2.0),
            Instruction::MouseDown {
                button: "left".to_string(),
                x: 10,
                y: 20,
            },
            Instruction::Wait(0.25),
            Instruction::MouseUp {
                button: "left".to_string(),
                x: 10,
                y: 20,
            },
        ];
        assert_eq!(render(&instructions), render(&instructions));
    }
}
