/// Indicate the position of the document.
/// This function will show the line number and column number of the position.
///
/// ```
/// use textree::indicated_msg;
///
/// let doc = indicated_msg("<a>\n<b></c>", 4);
/// assert_eq!(doc, "2:1\n<b></c>\n^")
/// ```
///
/// If print the string, it would be like:
///
/// ```bash
/// 2:1
/// <b></c>
/// ^
/// ```
///
/// This may be what you need to indicate an error on the invalid data.
pub fn indicated_msg(doc: &str, mut pos: u64) -> String {
    for (line, str_line) in doc.split('\n').enumerate() {
        let full_line = str_line.len() as u64 + 1;
        if full_line > pos {
            let column = pos as usize;
            return format!(
                "{}:{}\n{}\n{}^",
                line + 1,
                column + 1,
                str_line,
                " ".repeat(column)
            );
        } else {
            pos -= full_line;
        }
    }
    // Out-of-range positions point at the end of the document.
    format!("{}\n^", doc.lines().last().unwrap_or(""))
}
