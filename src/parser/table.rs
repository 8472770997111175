use super::markup;

/// Inner markup of the first `<table>` in `section`.
pub fn find_table(section: &str) -> Option<&str> {
    markup::find_element(section, "table", 0).map(|el| &section[el.inner])
}

/// Row contents of the table body, inner markup preserved. A table without a
/// `<tbody>` yields no rows.
pub fn extract_rows(table: &str) -> Vec<&str> {
    let Some(body) = markup::find_element(table, "tbody", 0) else {
        return Vec::new();
    };
    let body = &table[body.inner];
    markup::find_elements(body, "tr")
        .into_iter()
        .map(|el| &body[el.inner])
        .collect()
}

/// Data cell contents of one row, inner markup preserved.
pub fn extract_cells(row: &str) -> Vec<&str> {
    markup::find_elements(row, "td")
        .into_iter()
        .map(|el| &row[el.inner])
        .collect()
}

/// A row made only of `<th>` cells.
pub fn is_header_row(row: &str) -> bool {
    extract_cells(row).is_empty() && markup::find_element(row, "th", 0).is_some()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
<p>intro</p>
<table class="propertySet">
  <thead><tr><th>Name</th><th>Property Type</th><th>Data Type</th><th>Description</th></tr></thead>
  <tbody>
    <tr>
      <td>FireRating</td>
      <td><a href="IfcPropertySingleValue.htm">IfcPropertySingleValue</a></td>
      <td><a href="IfcLabel.htm">IfcLabel</a></td>
      <td>Fire rating
          given according to the national code.</td>
    </tr>
    <tr><td>IsExternal</td><td>IfcPropertySingleValue</td><td><a href="IfcBoolean.htm">IfcBoolean</a></td><td></td></tr>
  </tbody>
</table>"#;

    #[test]
    fn rows_and_cells() {
        let table = find_table(TABLE).unwrap();
        let rows = extract_rows(table);
        assert_eq!(rows.len(), 2);

        let cells = extract_cells(rows[0]);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], "FireRating");
        assert!(cells[2].contains(r#"<a href="IfcLabel.htm">"#));
        assert!(cells[3].contains('\n'));

        let cells = extract_cells(rows[1]);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], "");
    }

    #[test]
    fn header_rows_excluded_from_body() {
        let table = find_table(TABLE).unwrap();
        assert!(extract_rows(table).iter().all(|r| !r.contains("<th>")));
    }

    #[test]
    fn no_tbody_no_rows() {
        let table = find_table("<table><tr><td>a</td></tr></table>").unwrap();
        assert!(extract_rows(table).is_empty());
    }

    #[test]
    fn no_table() {
        assert!(find_table("<p>nothing tabular</p>").is_none());
    }

    #[test]
    fn header_row_detection() {
        assert!(is_header_row("<th>Name</th><th>Type</th>"));
        assert!(!is_header_row("<td>Name</td>"));
        assert!(!is_header_row(""));
    }
}
