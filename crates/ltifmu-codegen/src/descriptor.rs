//! Interface descriptor (`modelDescription.xml`) generation.
//!
//! Scalar variables are listed in register order so that every entry's
//! 1-based position in `<ModelVariables>` is its value reference plus one.
//! Hosts resolve `derivative=`, `<Unknown index=>` and friends positionally,
//! so that equality must hold for every entry.

use std::fmt;

use ltifmu_model::{Block, LtiModel, VariableLayout};

use crate::error::Result;
use crate::identity::BuildIdentity;
use crate::literal::c_double;
use crate::source::{check_layout, SOURCE_FILE_NAME};

/// Archive-relative path of the descriptor.
pub const DESCRIPTOR_FILE_NAME: &str = "modelDescription.xml";

/// Logging categories understood by the runtime skeleton.
pub const LOG_CATEGORIES: [&str; 4] = ["logAll", "logError", "logFmiCall", "logEvent"];

const DEFAULT_START_TIME: f64 = 0.0;
const DEFAULT_STOP_TIME: f64 = 1.0;
const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Render the interface descriptor for `model`.
pub fn render_descriptor(
    model: &LtiModel,
    layout: &VariableLayout,
    identity: &BuildIdentity,
) -> Result<String> {
    check_layout(model, layout)?;
    tracing::debug!(
        identifier = identity.identifier(),
        variables = layout.register_count(),
        "rendering model description"
    );
    Ok(ModelDescription {
        model,
        layout,
        identity,
    }
    .to_string())
}

struct ModelDescription<'a> {
    model: &'a LtiModel,
    layout: &'a VariableLayout,
    identity: &'a BuildIdentity,
}

impl ModelDescription<'_> {
    fn write_modes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.identity.identifier();
        writeln!(f, "  <ModelExchange")?;
        writeln!(f, "    modelIdentifier=\"{id}\"")?;
        writeln!(f, "    canGetAndSetFMUstate=\"false\"")?;
        writeln!(f, "    canSerializeFMUstate=\"false\"")?;
        writeln!(f, "    providesDirectionalDerivative=\"false\">")?;
        write_source_files(f)?;
        writeln!(f, "  </ModelExchange>")?;
        writeln!(f)?;
        writeln!(f, "  <CoSimulation")?;
        writeln!(f, "    modelIdentifier=\"{id}\"")?;
        writeln!(f, "    canHandleVariableCommunicationStepSize=\"false\"")?;
        writeln!(f, "    canNotUseMemoryManagementFunctions=\"false\"")?;
        writeln!(f, "    canGetAndSetFMUstate=\"false\"")?;
        writeln!(f, "    canSerializeFMUstate=\"false\">")?;
        write_source_files(f)?;
        writeln!(f, "  </CoSimulation>")?;
        writeln!(f)?;
        writeln!(f, "  <LogCategories>")?;
        for name in LOG_CATEGORIES {
            writeln!(f, "    <Category name=\"{name}\"/>")?;
        }
        writeln!(f, "  </LogCategories>")?;
        writeln!(f)?;
        writeln!(
            f,
            "  <DefaultExperiment startTime=\"{}\" stopTime=\"{}\" tolerance=\"{}\"/>",
            c_double(DEFAULT_START_TIME),
            c_double(DEFAULT_STOP_TIME),
            c_double(DEFAULT_TOLERANCE),
        )?;
        writeln!(f)
    }

    fn write_variable(&self, f: &mut fmt::Formatter<'_>, block: Block, i: usize) -> fmt::Result {
        let layout = self.layout;
        let vr = layout.base(block) + i;
        let n = i + 1;
        writeln!(f, "    <!-- index {} -->", vr + 1)?;
        match block {
            Block::State => {
                writeln!(
                    f,
                    "    <ScalarVariable name=\"x{n}\" valueReference=\"{vr}\" description=\"Continuous state {n}\">"
                )?;
                writeln!(f, "      <Real/>")?;
            }
            Block::Derivative => {
                let state_index = layout.base(Block::State) + i + 1;
                writeln!(
                    f,
                    "    <ScalarVariable name=\"der_x{n}\" valueReference=\"{vr}\" description=\"State derivative {n}\">"
                )?;
                writeln!(f, "      <Real derivative=\"{state_index}\"/>")?;
            }
            Block::StateStart => {
                writeln!(
                    f,
                    "    <ScalarVariable name=\"x{n}_start\" valueReference=\"{vr}\" description=\"Start value for x{n}\" causality=\"parameter\" variability=\"fixed\">"
                )?;
                writeln!(f, "      <Real start=\"{}\"/>", c_double(self.model.x0()[i]))?;
            }
            Block::Input => {
                writeln!(
                    f,
                    "    <ScalarVariable name=\"u{n}\" valueReference=\"{vr}\" description=\"Model input {n}\" causality=\"input\">"
                )?;
                writeln!(f, "      <Real start=\"{}\"/>", c_double(self.model.u0()[i]))?;
            }
            Block::InputStart => {
                writeln!(
                    f,
                    "    <ScalarVariable name=\"u{n}_start\" valueReference=\"{vr}\" description=\"Start value for u{n}\" causality=\"parameter\" variability=\"fixed\">"
                )?;
                writeln!(f, "      <Real start=\"{}\"/>", c_double(self.model.u0()[i]))?;
            }
            Block::Output => {
                writeln!(
                    f,
                    "    <ScalarVariable name=\"y{n}\" valueReference=\"{vr}\" description=\"Model output {n}\" causality=\"output\">"
                )?;
                writeln!(f, "      <Real/>")?;
            }
        }
        writeln!(f, "    </ScalarVariable>")
    }

    fn write_structure(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        writeln!(f, "  <ModelStructure>")?;
        write_unknowns(f, layout, "Outputs", &[Block::Output])?;
        write_unknowns(f, layout, "Derivatives", &[Block::Derivative])?;
        write_unknowns(
            f,
            layout,
            "InitialUnknowns",
            &[Block::State, Block::Derivative, Block::Output],
        )?;
        writeln!(f, "  </ModelStructure>")
    }
}

impl fmt::Display for ModelDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.identity;
        writeln!(f, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(f, "<fmiModelDescription")?;
        writeln!(f, "  xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"")?;
        writeln!(f, "  fmiVersion=\"2.0\"")?;
        writeln!(f, "  modelName=\"{}\"", id.identifier())?;
        writeln!(f, "  guid=\"{}\"", id.guid())?;
        writeln!(f, "  generationTool=\"ltifmu {}\"", env!("CARGO_PKG_VERSION"))?;
        writeln!(f, "  generationDateAndTime=\"{}\"", id.timestamp_string())?;
        writeln!(f, "  variableNamingConvention=\"flat\"")?;
        writeln!(f, "  numberOfEventIndicators=\"0\">")?;
        writeln!(f)?;
        self.write_modes(f)?;

        writeln!(f, "  <ModelVariables>")?;
        for block in Block::ORDER {
            for i in 0..self.layout.size(block) {
                self.write_variable(f, block, i)?;
            }
        }
        writeln!(f, "  </ModelVariables>")?;
        writeln!(f)?;
        self.write_structure(f)?;
        writeln!(f, "</fmiModelDescription>")
    }
}

/// One `<Unknown>` per register of `blocks`; nothing at all when they are empty.
fn write_unknowns(
    f: &mut fmt::Formatter<'_>,
    layout: &VariableLayout,
    tag: &str,
    blocks: &[Block],
) -> fmt::Result {
    let mut indices = blocks.iter().flat_map(|&b| layout.range(b)).peekable();
    if indices.peek().is_none() {
        return Ok(());
    }
    writeln!(f, "    <{tag}>")?;
    for vr in indices {
        writeln!(f, "      <Unknown index=\"{}\"/>", vr + 1)?;
    }
    writeln!(f, "    </{tag}>")
}

fn write_source_files(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "    <SourceFiles>")?;
    writeln!(f, "      <File name=\"{SOURCE_FILE_NAME}\"/>")?;
    writeln!(f, "    </SourceFiles>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltifmu_model::{ModelSpec, StateSpaceSpec};
    use std::time::{Duration, UNIX_EPOCH};
    use uuid::Uuid;

    fn identity() -> BuildIdentity {
        let ts = UNIX_EPOCH + Duration::from_secs(1_704_110_400);
        BuildIdentity::with_guid("plant", Uuid::from_u128(7), ts).unwrap()
    }

    fn model() -> LtiModel {
        ModelSpec::StateSpace(StateSpaceSpec {
            a: Some(vec![vec![0.0, 1.0], vec![-2.0, -3.0]]),
            b: Some(vec![vec![0.0], vec![1.0]]),
            c: Some(vec![vec![1.0, 0.0]]),
            x0: Some(vec![0.5, -0.25]),
            u0: Some(vec![2.0]),
            ..StateSpaceSpec::default()
        })
        .realize()
        .unwrap()
    }

    /// Integer values of every `attr="..."` occurrence, in document order.
    fn attribute_values(xml: &str, attr: &str) -> Vec<usize> {
        let needle = format!(" {attr}=\"");
        xml.match_indices(&needle)
            .map(|(pos, _)| {
                let rest = &xml[pos + needle.len()..];
                let end = rest.find('"').unwrap();
                rest[..end].parse().unwrap()
            })
            .collect()
    }

    fn section<'a>(xml: &'a str, tag: &str) -> &'a str {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        match (xml.find(&open), xml.find(&close)) {
            (Some(start), Some(end)) => &xml[start..end],
            _ => "",
        }
    }

    #[test]
    fn value_references_follow_layout() {
        let model = model();
        let layout = model.layout();
        let xml = render_descriptor(&model, &layout, &identity()).unwrap();

        let vrs = attribute_values(&xml, "valueReference");
        assert_eq!(vrs, (0..layout.register_count()).collect::<Vec<_>>());

        let outputs = attribute_values(section(&xml, "Outputs"), "index");
        let expected: Vec<_> = layout.range(Block::Output).map(|vr| vr + 1).collect();
        assert_eq!(outputs, expected);

        let derivatives = attribute_values(section(&xml, "Derivatives"), "index");
        let expected: Vec<_> = layout.range(Block::Derivative).map(|vr| vr + 1).collect();
        assert_eq!(derivatives, expected);

        // Each derivative points back at its state's 1-based position.
        let states: Vec<_> = layout.range(Block::State).map(|vr| vr + 1).collect();
        assert_eq!(attribute_values(&xml, "derivative"), states);
    }

    #[test]
    fn start_values_and_causalities() {
        let model = model();
        let xml = render_descriptor(&model, &model.layout(), &identity()).unwrap();
        assert!(xml.contains(
            "name=\"x1_start\" valueReference=\"4\" description=\"Start value for x1\" causality=\"parameter\" variability=\"fixed\">\n      <Real start=\"0.5\"/>"
        ));
        assert!(xml.contains("name=\"x2_start\" valueReference=\"5\""));
        assert!(xml.contains("<Real start=\"-0.25\"/>"));
        assert!(xml.contains(
            "name=\"u1\" valueReference=\"6\" description=\"Model input 1\" causality=\"input\">\n      <Real start=\"2.0\"/>"
        ));
        assert!(xml.contains("name=\"y1\" valueReference=\"8\""));
        assert!(xml.contains("causality=\"output\""));
    }

    #[test]
    fn header_and_modes() {
        let model = model();
        let xml = render_descriptor(&model, &model.layout(), &identity()).unwrap();
        assert!(xml.contains("guid=\"00000000-0000-0000-0000-000000000007\""));
        assert!(xml.contains("modelName=\"plant\""));
        assert!(xml.contains("generationDateAndTime=\"2024-01-01T12:00:00Z\""));
        assert!(xml.contains("numberOfEventIndicators=\"0\""));
        assert_eq!(xml.matches("modelIdentifier=\"plant\"").count(), 2);
        assert_eq!(xml.matches("<File name=\"fmi2model.c\"/>").count(), 2);
        assert!(xml.contains(
            "<DefaultExperiment startTime=\"0.0\" stopTime=\"1.0\" tolerance=\"0.0001\"/>"
        ));
        for category in LOG_CATEGORIES {
            assert!(xml.contains(&format!("<Category name=\"{category}\"/>")));
        }
    }

    #[test]
    fn initial_unknowns_are_ascending() {
        let model = model();
        let xml = render_descriptor(&model, &model.layout(), &identity()).unwrap();
        let unknowns = attribute_values(section(&xml, "InitialUnknowns"), "index");
        assert_eq!(unknowns, vec![1, 2, 3, 4, 9]);
    }

    #[test]
    fn empty_structure_sections_are_omitted() {
        let model = ModelSpec::StateSpace(StateSpaceSpec {
            d: Some(vec![vec![1.0, 2.0]]),
            ..StateSpaceSpec::default()
        })
        .realize()
        .unwrap();
        let xml = render_descriptor(&model, &model.layout(), &identity()).unwrap();
        assert!(!xml.contains("<Derivatives>"));
        assert!(xml.contains("<Outputs>"));
        assert_eq!(attribute_values(&xml, "valueReference"), vec![0, 1, 2, 3, 4]);
    }
}
