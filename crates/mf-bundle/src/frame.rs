//! Test framing: wraps a raw monkey script in setup/teardown boilerplate.
//!
//! The generated text is consumed by the test runner verbatim, so the
//! template below must stay byte-for-byte stable.

use crate::{BundleError, Result};

/// Indentation applied to every line of the original script body.
pub const BODY_INDENT: &str = "    ";

/// Frame a script given as a sequence of lines.
///
/// Each line keeps its own terminator; lines are prefixed with
/// [`BODY_INDENT`] and concatenated without any added delimiter. The names
/// are substituted as-is (see [`check_parameters`] for the strict check).
pub fn frame<'a, I>(lines: I, test_name: &str, app_name: &str, app_id: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let content: String = lines
        .into_iter()
        .map(|line| format!("{BODY_INDENT}{line}"))
        .collect();

    format!(
        r#"
#metadata
# {{
#   "pebble": true
# }}
#/metadata

setup {{
    context bigboard
}}

test {test_name} {{
    context bigboard

    # Uninstall the app if it exists
    do macro remove_app_if_installed "{app_id}"

    # (Re)install the app
    do install_app app.pbw
    do launch_app "{app_name}"
    do wait 2

    do macro constrain_execution

{content}
}}
"#
    )
}

/// Frame a whole script body, splitting it into lines at `\n`.
pub fn frame_script(body: &str, test_name: &str, app_name: &str, app_id: &str) -> String {
    frame(body.split_inclusive('\n'), test_name, app_name, app_id)
}

/// Reject parameter values that would break the generated script.
///
/// Quotes and line breaks are refused everywhere; the test name is also used
/// as a bare block label, so braces and whitespace are refused there too.
pub fn check_parameters(test_name: &str, app_name: &str, app_id: &str) -> Result<()> {
    let breaks_quoting = |c: char| matches!(c, '"' | '\n' | '\r');

    if test_name.is_empty()
        || test_name
            .chars()
            .any(|c| breaks_quoting(c) || c == '{' || c == '}' || c.is_whitespace())
    {
        return Err(unsafe_parameter("test name", test_name));
    }
    if app_name.chars().any(breaks_quoting) {
        return Err(unsafe_parameter("app name", app_name));
    }
    if app_id.chars().any(breaks_quoting) {
        return Err(unsafe_parameter("app id", app_id));
    }
    Ok(())
}

fn unsafe_parameter(parameter: &'static str, value: &str) -> BundleError {
    BundleError::UnsafeParameter {
        parameter,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_PRESS_BACK: &str = r#"
#metadata
# {
#   "pebble": true
# }
#/metadata

setup {
    context bigboard
}

test script {
    context bigboard

    # Uninstall the app if it exists
    do macro remove_app_if_installed "1234"

    # (Re)install the app
    do install_app app.pbw
    do launch_app "MyApp"
    do wait 2

    do macro constrain_execution

    press BACK

}
"#;

    #[test]
    fn test_frame_exact_output() {
        let framed = frame_script("press BACK\n", "script", "MyApp", "1234");
        assert_eq!(framed, EXPECTED_PRESS_BACK);
    }

    #[test]
    fn test_frame_contains_substitutions() {
        let framed = frame_script("wait 1\n", "my_test", "Weather", "abc-def");
        assert!(framed.contains("test my_test {"));
        assert!(framed.contains("remove_app_if_installed \"abc-def\""));
        assert!(framed.contains("launch_app \"Weather\""));
    }

    #[test]
    fn test_frame_indents_every_line_in_order() {
        let framed = frame_script("press UP\npress DOWN\r\nscreenshot", "t", "a", "u");
        assert!(framed.contains("    press UP\n    press DOWN\r\n    screenshot\n}\n"));
    }

    #[test]
    fn test_frame_empty_body() {
        let framed = frame_script("", "t", "a", "u");
        assert!(framed.ends_with("    do macro constrain_execution\n\n\n}\n"));
    }

    #[test]
    fn test_frame_lines_match_script() {
        let lines = ["press SELECT\n", "wait 2\n"];
        assert_eq!(
            frame(lines, "t", "a", "u"),
            frame_script("press SELECT\nwait 2\n", "t", "a", "u")
        );
    }

    #[test]
    fn test_frame_distinct_bodies_differ() {
        let bodies = ["a\nb\n", "b\na\n", "a\n", "a\nb", "", "\n"];
        for (i, x) in bodies.iter().enumerate() {
            for y in bodies.iter().skip(i + 1) {
                assert_ne!(
                    frame_script(x, "t", "a", "u"),
                    frame_script(y, "t", "a", "u"),
                    "bodies {x:?} and {y:?} collided"
                );
            }
        }
    }

    #[test]
    fn test_frame_does_not_escape() {
        let framed = frame_script("", "t", "My \"App\"", "u");
        assert!(framed.contains("launch_app \"My \"App\"\""));
    }

    #[test]
    fn test_check_parameters() {
        assert!(check_parameters("script", "MyApp", "1234").is_ok());
        assert!(check_parameters("script", "My App", "1234").is_ok());

        assert!(matches!(
            check_parameters("my test", "a", "u"),
            Err(BundleError::UnsafeParameter { parameter: "test name", .. })
        ));
        assert!(matches!(
            check_parameters("", "a", "u"),
            Err(BundleError::UnsafeParameter { parameter: "test name", .. })
        ));
        assert!(matches!(
            check_parameters("t", "a\"b", "u"),
            Err(BundleError::UnsafeParameter { parameter: "app name", .. })
        ));
        assert!(matches!(
            check_parameters("t", "a", "u\n"),
            Err(BundleError::UnsafeParameter { parameter: "app id", .. })
        ));
    }
}
