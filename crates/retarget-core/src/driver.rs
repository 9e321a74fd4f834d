//! Generation passes over whole programs.

use crate::dispatch::DispatchRegistry;
use crate::error::{GenerateError, RenderError};
use crate::node::CodeNode;
use crate::overlay::Overlay;
use crate::render::{Renderer, Value, Values};
use crate::state::RunState;
use crate::visit::Visitor;
use retarget_syntax::{Program, reader_for_dialect};

/// Whether a run starts from (and returns to) a fresh state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Independent run: state is reset before and after.
    #[default]
    Standalone,
    /// Continue from the previous run's scopes, temps, used built-ins and
    /// output (an interactive session).
    Chained,
}

/// Drives one overlay over any number of programs.
pub struct Transpiler {
    overlay: Overlay,
    registry: DispatchRegistry,
    state: RunState,
}

impl Transpiler {
    pub fn new(overlay: Overlay) -> Self {
        Self::with_registry(overlay, DispatchRegistry::standard())
    }

    pub fn with_registry(overlay: Overlay, registry: DispatchRegistry) -> Self {
        Transpiler {
            overlay,
            registry,
            state: RunState::new(),
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Parse `source` with the `dialect` front end and generate target text.
    pub fn generate(&mut self, source: &str, dialect: &str, mode: Mode) -> Result<String, GenerateError> {
        let reader = reader_for_dialect(dialect)
            .ok_or_else(|| GenerateError::UnknownDialect(dialect.to_string()))?;
        let program = reader.read(source)?;
        self.generate_program(&program, mode)
    }

    /// Generate target text for an already parsed program.
    ///
    /// All statements are visited before any is rendered, so templates see
    /// the final mutability of every symbol.
    #[tracing::instrument(level = "debug", skip_all, fields(target_language = %self.overlay.target(), statements = program.body.len(), mode = ?mode))]
    pub fn generate_program(&mut self, program: &Program, mode: Mode) -> Result<String, GenerateError> {
        match mode {
            Mode::Standalone => {
                self.state.reset();
                let result = self.run(program);
                self.state.reset();
                result
            }
            Mode::Chained => {
                // A failed entry leaves no trace in the session.
                let snapshot = self.state.clone();
                self.state.set_chained(true);
                let result = self.run(program);
                if result.is_err() {
                    self.state = snapshot;
                }
                result
            }
        }
    }

    fn run(&mut self, program: &Program) -> Result<String, GenerateError> {
        let mut visitor = Visitor::new(&self.overlay, &self.registry, &mut self.state);
        let codes: Vec<CodeNode> = visitor.visit_scope(&program.body);

        let mut lines = Vec::new();
        for code in &codes {
            let text = code.render(&self.overlay, self.state.symbols())?;
            lines.extend(text.lines().map(str::to_string));
        }
        self.state.push_output(lines);

        let text = self.assemble()?;
        tracing::debug!(lines = self.state.output().len(), used = self.state.used().len(), "program generated");
        Ok(text)
    }

    /// Instantiate the `program` template over the accumulated output.
    fn assemble(&self) -> Result<String, RenderError> {
        let lines = self.state.output();
        let used = self.state.used();

        let mut values = Values::new();
        values.insert("body".into(), Value::Text(lines.join("\n")));
        values.insert(
            "lines".into(),
            Value::List(lines.iter().cloned().map(Value::Text).collect()),
        );
        values.insert(
            "used".into(),
            Value::List(used.iter().cloned().map(Value::Text).collect()),
        );
        values.insert(
            "uses".into(),
            Value::Node {
                text: String::new(),
                fields: used.iter().map(|name| (name.clone(), Value::Bool(true))).collect(),
            },
        );

        self.overlay
            .render("program", &values)
            .map_err(|err| match err {
                RenderError::UnknownTemplate(template) => RenderError::MissingTemplate {
                    kind: "Program".into(),
                    template,
                    line: 0,
                },
                other => other,
            })
    }
}
