//! C header rendering.
//!
//! Produces a header with one `PROGMEM` table per export unit. Output is
//! fully determined by its input and always uses CRLF line endings.

use crate::convert::{ConversionResult, ConvertOptions, ExportUnit};

const EOL: &str = "\r\n";

/// Renders every unit of a conversion as a C header.
///
/// With no units the result is just the header comment block.
pub fn render_text(result: &ConversionResult, options: &ConvertOptions) -> String {
    let mut out = String::new();
    push_line(&mut out, "#pragma once");
    push_line(&mut out, &format!("#include \"{}\"", options.header_include));
    push_line(&mut out, "");
    push_line(
        &mut out,
        &format!("// Total: {} bytes", result.total_bytes()),
    );

    for unit in &result.units {
        render_unit(&mut out, unit);
    }

    out
}

fn render_unit(out: &mut String, unit: &ExportUnit) {
    push_line(out, "");
    // Track names come from the file and may contain line breaks
    let label = unit.label.replace(['\r', '\n'], " ");
    push_line(out, &format!("// {}", label));
    push_line(
        out,
        &format!("static const MIDINote {}[] PROGMEM = {{", unit.ident),
    );
    for record in &unit.stream {
        push_line(
            out,
            &format!(
                "\t{{{}, {}, {}}},",
                record.pitch, record.duration8, record.delay
            ),
        );
    }
    push_line(out, "};");
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str(EOL);
}
