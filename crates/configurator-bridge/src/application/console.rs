//! Console control panel: command parsing, execution, and text rendering.
//!
//! Each console line is one command.  Flags on a dispatch command update the
//! corresponding held form fields first, then the form is sent as-is; fields
//! never set go out as `null`.
//!
//! ```text
//! > requirement --node n1 --value 5 --selection false
//! sent elfsquad.updateRequirement
//! > nodes
//!   (none)  Select a node
//!   n1      Engine
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use configurator_core::application::RequirementForm;
use configurator_core::{CommandSender, FeatureNode, HarnessState, SendError};
use serde_json::Value;
use thiserror::Error;

use crate::application::session::Harness;
use crate::infrastructure::image_reader::ImageError;

/// Label of the empty option that heads every node list.
pub const NODE_PLACEHOLDER: &str = "Select a node";

/// Error type for console command handling.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The line is not a valid command.  Carries clap's usage text, which is
    /// also how `help` output is delivered.
    #[error("{0}")]
    Usage(String),

    /// A quoted argument was never closed.
    #[error("unterminated quote in console line")]
    UnterminatedQuote,

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
}

// ── Command grammar ───────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "console", no_binary_name = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

/// One console command.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ConsoleCommand {
    /// Ask the configurator to publish its current configuration.
    Trigger,
    /// Send updateRequirement with the held requirement fields.
    Requirement(RequirementFlags),
    /// Send updateRequirements with the held fields as a single row.
    Requirements(RequirementFlags),
    /// Send updateTextValue.
    Text {
        #[arg(long)]
        node: Option<String>,
        #[arg(long)]
        value: Option<String>,
    },
    /// Send updateImageValue, optionally loading a new image file first.
    Image {
        #[arg(long)]
        node: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Send updateLinkedConfigurationCardinality.
    Cardinality {
        /// Overrides the held configuration's id.
        #[arg(long)]
        configuration: Option<String>,
        #[arg(long)]
        parent_node: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        cardinality: Option<i64>,
    },
    /// Send removeLinkedConfiguration.
    RemoveLinked {
        #[arg(long)]
        id: Option<String>,
    },
    /// List selectable feature nodes.
    Nodes,
    /// List selectable image nodes.
    Images,
    /// List linked configurations and linkable models.
    Linked,
    /// Print received messages, newest first.
    Log {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the held configuration.
    Config,
    /// Leave the console.
    #[command(alias = "exit")]
    Quit,
}

/// Flags shared by `requirement` and `requirements`.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct RequirementFlags {
    #[arg(long)]
    pub node: Option<String>,
    /// Parsed as JSON when possible, otherwise sent as a string.
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<String>,
    #[arg(long)]
    pub selection: Option<bool>,
}

/// What the console loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleOutcome {
    Output(String),
    Quit,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses one console line.  Returns `Ok(None)` for a blank line.
///
/// # Errors
///
/// Returns [`ConsoleError::Usage`] for unknown commands, bad flags, and
/// `help`, and [`ConsoleError::UnterminatedQuote`] for an open quote.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| ConsoleError::Usage(e.render().to_string()))
}

/// Splits on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, ConsoleError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err(ConsoleError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Interprets a `--value` argument: JSON when it parses, a string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn apply_requirement_flags(form: &mut RequirementForm, flags: RequirementFlags) {
    if let Some(node) = flags.node {
        form.node_id = Some(node);
    }
    if let Some(value) = flags.value {
        form.value = parse_value(&value);
    }
    if let Some(selection) = flags.selection {
        form.is_selection = Some(selection);
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Runs one command against `harness`.
///
/// # Errors
///
/// Returns [`ConsoleError::Send`] when a command cannot be sent,
/// [`ConsoleError::Image`] when an image file cannot be read, and
/// [`ConsoleError::Render`] if held JSON cannot be printed.
pub async fn execute<S: CommandSender>(
    harness: &mut Harness<S>,
    command: ConsoleCommand,
) -> Result<ConsoleOutcome, ConsoleError> {
    match command {
        ConsoleCommand::Trigger => {
            harness.trigger_configuration_updated().await?;
            sent("triggerConfigurationUpdated")
        }
        ConsoleCommand::Requirement(flags) => {
            apply_requirement_flags(&mut harness.forms_mut().requirement, flags);
            harness.update_requirement().await?;
            sent("updateRequirement")
        }
        ConsoleCommand::Requirements(flags) => {
            apply_requirement_flags(&mut harness.forms_mut().requirements, flags);
            harness.update_requirements().await?;
            sent("updateRequirements")
        }
        ConsoleCommand::Text { node, value } => {
            let form = &mut harness.forms_mut().text_value;
            if node.is_some() {
                form.node_id = node;
            }
            if value.is_some() {
                form.value = value;
            }
            harness.update_text_value().await?;
            sent("updateTextValue")
        }
        ConsoleCommand::Image { node, file } => {
            if node.is_some() {
                harness.forms_mut().image_value.node_id = node;
            }
            if let Some(path) = file {
                harness.load_image(&path).await?;
            }
            harness.update_image_value().await?;
            sent("updateImageValue")
        }
        ConsoleCommand::Cardinality {
            configuration,
            parent_node,
            cardinality,
        } => {
            let form = &mut harness.forms_mut().cardinality;
            if configuration.is_some() {
                form.configuration_id = configuration;
            }
            if parent_node.is_some() {
                form.parent_node_id = parent_node;
            }
            if cardinality.is_some() {
                form.cardinality = cardinality;
            }
            harness.update_linked_configuration_cardinality().await?;
            sent("updateLinkedConfigurationCardinality")
        }
        ConsoleCommand::RemoveLinked { id } => {
            if id.is_some() {
                harness.forms_mut().remove_linked.linked_configuration_id = id;
            }
            harness.remove_linked_configuration().await?;
            sent("removeLinkedConfiguration")
        }
        ConsoleCommand::Nodes => {
            let state = harness.state().await;
            let nodes = state.selectable_nodes();
            Ok(ConsoleOutcome::Output(render_node_options(nodes.as_deref())))
        }
        ConsoleCommand::Images => {
            let state = harness.state().await;
            let nodes = state.selectable_image_nodes();
            Ok(ConsoleOutcome::Output(render_node_options(Some(nodes.as_slice()))))
        }
        ConsoleCommand::Linked => {
            let state = harness.state().await;
            Ok(ConsoleOutcome::Output(render_linked(&state)))
        }
        ConsoleCommand::Log { limit } => {
            let state = harness.state().await;
            Ok(ConsoleOutcome::Output(render_log(&state, limit)?))
        }
        ConsoleCommand::Config => {
            let state = harness.state().await;
            let text = match state.configuration() {
                Some(snapshot) => serde_json::to_string_pretty(snapshot.raw())?,
                None => "no configuration loaded".to_string(),
            };
            Ok(ConsoleOutcome::Output(text))
        }
        ConsoleCommand::Quit => Ok(ConsoleOutcome::Quit),
    }
}

fn sent(command: &str) -> Result<ConsoleOutcome, ConsoleError> {
    Ok(ConsoleOutcome::Output(format!("sent elfsquad.{command}")))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Node option list: the placeholder first, then one line per node.
pub fn render_node_options(nodes: Option<&[&FeatureNode]>) -> String {
    let mut lines = vec![format!("  {:<8}{NODE_PLACEHOLDER}", "(none)")];
    for node in nodes.unwrap_or_default() {
        lines.push(format!("  {:<8}{}", node.id, node.display_name()));
    }
    lines.join("\n")
}

fn render_linked(state: &HarnessState) -> String {
    let Some(tree) = state.configuration_tree() else {
        return "no configuration loaded".to_string();
    };

    let mut lines = Vec::new();
    lines.push("linked configurations:".to_string());
    if tree.linked().is_empty() {
        lines.push("  (none)".to_string());
    }
    for linked in tree.linked() {
        lines.push(format!("  {}", linked.id.as_deref().unwrap_or("(no id)")));
    }

    lines.push("linkable models:".to_string());
    if tree.linked_models().is_empty() {
        lines.push("  (none)".to_string());
    }
    for model in tree.linked_models() {
        lines.push(format!(
            "  {}  {}",
            model.id.as_deref().unwrap_or("(no id)"),
            model.name.as_deref().unwrap_or("")
        ));
    }
    lines.join("\n")
}

fn render_log(state: &HarnessState, limit: Option<usize>) -> Result<String, serde_json::Error> {
    let log = state.message_log();
    if log.is_empty() {
        return Ok("no messages received".to_string());
    }
    let mut entries = log.to_json();
    if let (Some(limit), Value::Array(items)) = (limit, &mut entries) {
        items.truncate(limit);
    }
    serde_json::to_string_pretty(&entries)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hub::MessageHub;
    use crate::application::session::tests::RecordingSender;
    use configurator_core::DispatchOptions;
    use serde_json::json;
    use std::time::Duration;

    fn parse(line: &str) -> ConsoleCommand {
        parse_line(line).unwrap().unwrap()
    }

    async fn loaded_harness(
        configuration: Value,
    ) -> (Harness<RecordingSender>, RecordingSender, MessageHub) {
        let hub = MessageHub::new();
        let sender = RecordingSender::default();
        let mut harness = Harness::new(sender.clone(), DispatchOptions::default());
        harness.mount(&hub).await.unwrap();
        hub.deliver(json!({"name": "elfsquad.configurationUpdated", "args": configuration}));
        tokio::time::timeout(Duration::from_secs(2), harness.wait_for_messages(1))
            .await
            .unwrap();
        (harness, sender, hub)
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_blank_line_parses_to_none() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_requirement_flags() {
        let cmd = parse("requirement --node n1 --value 5 --selection false");
        assert_eq!(
            cmd,
            ConsoleCommand::Requirement(RequirementFlags {
                node: Some("n1".into()),
                value: Some("5".into()),
                selection: Some(false),
            })
        );
    }

    #[test]
    fn test_parse_quoted_text_value() {
        let cmd = parse(r#"text --node t1 --value "hello world""#);
        assert_eq!(
            cmd,
            ConsoleCommand::Text {
                node: Some("t1".into()),
                value: Some("hello world".into()),
            }
        );
    }

    #[test]
    fn test_parse_kebab_case_commands() {
        assert_eq!(
            parse("remove-linked --id lc-1"),
            ConsoleCommand::RemoveLinked { id: Some("lc-1".into()) }
        );
        assert_eq!(
            parse("cardinality --parent-node p1 --cardinality 3"),
            ConsoleCommand::Cardinality {
                configuration: None,
                parent_node: Some("p1".into()),
                cardinality: Some(3),
            }
        );
    }

    #[test]
    fn test_parse_exit_alias() {
        assert_eq!(parse("exit"), ConsoleCommand::Quit);
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        assert!(matches!(parse_line("frobnicate"), Err(ConsoleError::Usage(_))));
    }

    #[test]
    fn test_help_is_usage_error_with_command_list() {
        match parse_line("help") {
            Err(ConsoleError::Usage(text)) => assert!(text.contains("requirement")),
            other => panic!("expected usage text, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(matches!(
            parse_line(r#"text --value "open"#),
            Err(ConsoleError::UnterminatedQuote)
        ));
    }

    #[test]
    fn test_parse_value_prefers_json() {
        assert_eq!(parse_value("5"), json!(5));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_value("red"), json!("red"));
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_without_nodes_shows_only_placeholder() {
        let text = render_node_options(None);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(NODE_PLACEHOLDER));
    }

    #[test]
    fn test_render_lists_nodes_after_placeholder() {
        let node = FeatureNode {
            id: "n1".into(),
            name: Some("Engine".into()),
            ..Default::default()
        };
        let text = render_node_options(Some(&[&node][..]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(NODE_PLACEHOLDER));
        assert!(lines[1].contains("n1") && lines[1].contains("Engine"));
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_execute_requirement_updates_form_and_sends() {
        // Arrange
        let (mut harness, sender, _hub) = loaded_harness(json!({"id": "cfg-1", "steps": []})).await;

        // Act
        let outcome = execute(&mut harness, parse("requirement --node n1 --value 5 --selection false"))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            outcome,
            ConsoleOutcome::Output("sent elfsquad.updateRequirement".into())
        );
        assert_eq!(
            sender.last().unwrap().args,
            json!({
                "nodeId": "n1",
                "value": 5,
                "isSelection": false,
                "ignoreConflicts": true,
                "configurationId": "cfg-1"
            })
        );
    }

    #[tokio::test]
    async fn test_execute_keeps_held_fields_between_commands() {
        let (mut harness, sender, _hub) = loaded_harness(json!({"id": "cfg-1", "steps": []})).await;

        execute(&mut harness, parse("text --node t1 --value first")).await.unwrap();
        execute(&mut harness, parse("text --value second")).await.unwrap();

        let args = sender.last().unwrap().args;
        assert_eq!(args["nodeId"], json!("t1"));
        assert_eq!(args["value"], json!("second"));
    }

    #[tokio::test]
    async fn test_execute_nodes_lists_flattened_tree() {
        let (mut harness, _sender, _hub) = loaded_harness(json!({
            "id": "cfg-1",
            "steps": [{"features": [
                {"id": "a", "name": "A", "features": [{"id": "b", "featureType": 4}]}
            ]}]
        }))
        .await;

        let ConsoleOutcome::Output(text) = execute(&mut harness, ConsoleCommand::Nodes).await.unwrap()
        else {
            panic!("expected output");
        };
        assert_eq!(text.lines().count(), 3);

        let ConsoleOutcome::Output(images) =
            execute(&mut harness, ConsoleCommand::Images).await.unwrap()
        else {
            panic!("expected output");
        };
        assert_eq!(images.lines().count(), 2);
        assert!(images.contains('b'));
    }

    #[tokio::test]
    async fn test_execute_log_respects_limit() {
        let (mut harness, _sender, hub) = loaded_harness(json!({"id": "cfg-1"})).await;
        hub.deliver(json!({"name": "elfsquad.other"}));
        harness.wait_for_messages(2).await;

        let ConsoleOutcome::Output(text) =
            execute(&mut harness, parse("log --limit 1")).await.unwrap()
        else {
            panic!("expected output");
        };
        let shown: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(shown, vec![json!({"name": "elfsquad.other"})]);
    }

    #[tokio::test]
    async fn test_execute_linked_lists_ids() {
        let (mut harness, _sender, _hub) = loaded_harness(json!({
            "id": "cfg-1",
            "linkedConfigurations": [{"id": "lc-1"}],
            "linkedConfigurationModels": [{"id": "m-1", "name": "Trailer"}]
        }))
        .await;

        let ConsoleOutcome::Output(text) =
            execute(&mut harness, ConsoleCommand::Linked).await.unwrap()
        else {
            panic!("expected output");
        };
        assert!(text.contains("lc-1"));
        assert!(text.contains("m-1") && text.contains("Trailer"));
    }

    #[tokio::test]
    async fn test_execute_config_without_configuration() {
        let mut harness = Harness::new(RecordingSender::default(), DispatchOptions::default());

        let outcome = execute(&mut harness, ConsoleCommand::Config).await.unwrap();

        assert_eq!(outcome, ConsoleOutcome::Output("no configuration loaded".into()));
    }

    #[tokio::test]
    async fn test_execute_quit() {
        let mut harness = Harness::new(RecordingSender::default(), DispatchOptions::default());
        let outcome = execute(&mut harness, ConsoleCommand::Quit).await.unwrap();
        assert_eq!(outcome, ConsoleOutcome::Quit);
    }
}
