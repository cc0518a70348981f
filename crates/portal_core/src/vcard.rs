use chrono::NaiveDate;

use crate::roster::Student;

/// Escapes a vCard 3.0 property value.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders one vCard per student, separated by blank lines.
///
/// The display name carries the roll number and optional suffix so the
/// contacts sort and search well on a phone.
pub fn render_vcards<'a>(students: impl IntoIterator<Item = &'a Student>, suffix: Option<&str>) -> String {
    let suffix = suffix.map(str::trim).filter(|s| !s.is_empty());
    let mut out = String::new();

    for student in students {
        let full_name = match suffix {
            Some(suffix) => format!("{} || {} || {}", student.name, student.roll, suffix),
            None => format!("{} || {}", student.name, student.roll),
        };
        let mut name_parts: Vec<&str> = student.name.split(' ').collect();
        let last_name = if name_parts.len() > 1 {
            name_parts.pop().map(escape_value).unwrap_or_default()
        } else {
            String::new()
        };
        let first_name = escape_value(&name_parts.join(" "));
        let roll = escape_value(&student.roll);

        out.push_str("BEGIN:VCARD\n");
        out.push_str("VERSION:3.0\n");
        out.push_str(&format!("FN:{}\n", escape_value(&full_name)));
        out.push_str(&format!("N:{last_name};{first_name};;;\n"));
        out.push_str(&format!("TEL;TYPE=CELL:{}\n", escape_value(&student.contact)));
        out.push_str(&format!("ORG:{roll}\n"));
        match suffix {
            Some(suffix) => out.push_str(&format!(
                "NOTE:Roll: {roll}\\nSuffix: {}\n",
                escape_value(suffix)
            )),
            None => out.push_str(&format!("NOTE:Roll: {roll}\n")),
        }
        out.push_str("END:VCARD\n\n");
    }

    out
}

/// `gopc_contacts_<date>[_<suffix>].vcf`, with non-alphanumerics in the suffix
/// replaced by `_`.
pub fn vcard_filename(date: NaiveDate, suffix: Option<&str>) -> String {
    let date = date.format("%Y-%m-%d");
    match suffix.map(str::trim).filter(|s| !s.is_empty()) {
        Some(suffix) => {
            let safe: String = suffix
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!("gopc_contacts_{date}_{safe}.vcf")
        }
        None => format!("gopc_contacts_{date}.vcf"),
    }
}
