//! Paint instructions derived from block geometry.
//!
//! The engine never draws. [`paint`] turns a laid-out [`Block`] into a flat
//! list of [`Instruction`]s in block order; a host [`Painter`] executes them
//! with whatever surface it owns.

use crate::layout::{Block, CellKind, Point, Shade, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    CodeBackground,
    QuoteBar,
    LatexBackground,
    Rule,
}

/// One drawing command in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    DrawText {
        at: Point,
        text: String,
        style: TextStyle,
    },
    DrawImage {
        at: Point,
        width: f32,
        height: f32,
        src: String,
    },
    FillRect {
        at: Point,
        width: f32,
        height: f32,
        fill: Fill,
    },
    /// Latex source handed to an external renderer. `display` is set for
    /// latex blocks, clear for inline latex.
    DrawLatex {
        at: Point,
        source: String,
        display: bool,
    },
}

/// Drawing surface supplied by the host.
pub trait Painter {
    fn execute(&mut self, instruction: &Instruction);

    fn execute_all(&mut self, instructions: &[Instruction]) {
        for instruction in instructions {
            self.execute(instruction);
        }
    }
}

/// Painter that keeps every instruction it is given. Used by tests and
/// benchmarks.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub instructions: Vec<Instruction>,
}

impl Painter for RecordingPainter {
    fn execute(&mut self, instruction: &Instruction) {
        self.instructions.push(instruction.clone());
    }
}

/// Paint instructions for `block` drawn with its top-left corner at `origin`.
pub fn paint(block: &Block, origin: Point) -> Vec<Instruction> {
    let mut out = Vec::new();
    let at = |x: f32, y: f32| Point::new(origin.x + x, origin.y + y);

    match block.shade {
        Shade::None => {}
        Shade::Code => out.push(Instruction::FillRect {
            at: origin,
            width: block.width,
            height: block.height,
            fill: Fill::CodeBackground,
        }),
        Shade::Quote => {
            let indent = block
                .lines
                .first()
                .and_then(|l| l.visual.first())
                .map(|v| v.indent)
                .unwrap_or(0.0);
            out.push(Instruction::FillRect {
                at: origin,
                width: indent / 2.0,
                height: block.height,
                fill: Fill::QuoteBar,
            });
        }
        Shade::Latex => {
            out.push(Instruction::FillRect {
                at: origin,
                width: block.width,
                height: block.height,
                fill: Fill::LatexBackground,
            });
            let source = block
                .lines
                .iter()
                .map(|l| l.text_cells().map(|c| c.text.as_str()).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n");
            out.push(Instruction::DrawLatex {
                at: origin,
                source,
                display: true,
            });
            return out;
        }
    }

    for visual in block.lines.iter().flat_map(|l| &l.visual) {
        if let Some(marker) = &visual.marker {
            out.push(Instruction::DrawText {
                at: at(0.0, visual.y),
                text: marker.clone(),
                style: TextStyle::default(),
            });
        }
        for cell in &visual.cells {
            let instruction = match &cell.kind {
                CellKind::Text(style) => {
                    if cell.text.is_empty() {
                        continue;
                    }
                    Instruction::DrawText {
                        at: at(cell.x, visual.y),
                        text: cell.text.clone(),
                        style: *style,
                    }
                }
                CellKind::Latex => Instruction::DrawLatex {
                    at: at(cell.x, visual.y),
                    source: cell.text.clone(),
                    display: false,
                },
                CellKind::Image { src } => Instruction::DrawImage {
                    at: at(cell.x, visual.y),
                    width: cell.width,
                    height: visual.height,
                    src: src.clone(),
                },
                CellKind::Rule => Instruction::FillRect {
                    at: at(cell.x, visual.y),
                    width: cell.width,
                    height: visual.height,
                    fill: Fill::Rule,
                },
            };
            out.push(instruction);
        }
    }
    out
}
