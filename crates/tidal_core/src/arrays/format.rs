//! Text table output for batches.

use std::fmt::Write as _;

use tidal_error::Result;

use super::batch::Batch;
use super::field::Schema;

/// Format batches as a boxed table.
///
/// Every batch should have `schema`. The header shows each field's name and
/// type.
///
/// ```text
/// +-------+-------+
/// | model | mpg   |
/// | Utf8  | Float |
/// +-------+-------+
/// ```
pub fn pretty_format_batches<'a>(
    schema: &Schema,
    batches: impl IntoIterator<Item = &'a Batch>,
) -> Result<String> {
    let names: Vec<String> = schema.fields.iter().map(|f| f.name.clone()).collect();
    let types: Vec<String> = schema
        .fields
        .iter()
        .map(|f| f.datatype.to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            let row = batch
                .row(row_idx)?
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            rows.push(row);
        }
    }

    let mut widths: Vec<usize> = names
        .iter()
        .zip(&types)
        .map(|(n, t)| n.chars().count().max(t.chars().count()))
        .collect();
    for row in &rows {
        for (width, val) in widths.iter_mut().zip(row) {
            *width = (*width).max(val.chars().count());
        }
    }

    let mut buf = String::new();
    let sep = separator(&widths);

    writeln!(buf, "{sep}")?;
    write_row(&mut buf, &widths, &names)?;
    write_row(&mut buf, &widths, &types)?;
    writeln!(buf, "{sep}")?;
    for row in &rows {
        write_row(&mut buf, &widths, row)?;
    }
    write!(buf, "{sep}")?;

    Ok(buf)
}

fn separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for width in widths {
        s.push_str(&"-".repeat(width + 2));
        s.push('+');
    }
    s
}

fn write_row(buf: &mut String, widths: &[usize], vals: &[String]) -> Result<()> {
    buf.push('|');
    for (width, val) in widths.iter().zip(vals) {
        write!(buf, " {val:<width$} |")?;
    }
    buf.push('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_batch;

    #[test]
    fn format_simple() {
        let batch = generate_batch!(("model", ["Mazda RX4", "Datsun 710"]), ("cyl", [6, 4]));
        let out = pretty_format_batches(batch.schema(), [&batch]).unwrap();

        let expected = [
            "+------------+-------+",
            "| model      | cyl   |",
            "| Utf8       | Int32 |",
            "+------------+-------+",
            "| Mazda RX4  | 6     |",
            "| Datsun 710 | 4     |",
            "+------------+-------+",
        ]
        .join("\n");

        assert_eq!(expected, out);
    }

    #[test]
    fn format_no_rows() {
        let batch = generate_batch!(("a", [1_i64]));
        let out = pretty_format_batches(batch.schema(), []).unwrap();
        assert_eq!(5, out.lines().count());
    }
}
