use client_core::ListState;
use shared::columns::{headers, Projection};

pub fn table<T: Projection>(state: &ListState<T>) -> String {
    let mut columns: Vec<String> = vec!["id".to_string()];
    columns.extend(headers::<T>().into_iter().map(str::to_string));

    let rows: Vec<Vec<String>> = state
        .items
        .iter()
        .map(|item| {
            let mut row = vec![item.id().to_string()];
            row.extend(item.row());
            row
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|label| label.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(&columns, &widths));
    out.push_str(&separator(&widths));
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    if rows.is_empty() {
        out.push_str("(no rows)\n");
    }
    out.push_str(&format!(
        "page {} of {}\n",
        state.current_page, state.total_pages
    ));
    out
}

pub fn detail<T: Projection>(record: &T) -> String {
    let mut width = "id".len();
    for column in T::COLUMNS {
        width = width.max(column.label.chars().count());
    }

    let mut out = String::new();
    out.push_str(&format!("{:<width$}  {}\n", "id", record.id()));
    for column in T::COLUMNS {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            column.label,
            record.cell(column.key)
        ));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

fn separator(widths: &[usize]) -> String {
    let dashes: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let mut line = dashes.join("  ");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::columns::Column;

    struct Widget {
        id: i64,
        name: String,
        grade: String,
    }

    impl Projection for Widget {
        const COLUMNS: &'static [Column] =
            &[Column::new("name", "Name"), Column::new("grade", "Grade")];

        fn id(&self) -> i64 {
            self.id
        }

        fn cell(&self, key: &str) -> String {
            match key {
                "name" => self.name.clone(),
                "grade" => self.grade.clone(),
                _ => String::new(),
            }
        }
    }

    fn state_with(items: Vec<Widget>) -> ListState<Widget> {
        ListState {
            items,
            ..ListState::default()
        }
    }

    #[test]
    fn aligns_columns_and_appends_the_page_footer() {
        let mut state = state_with(vec![
            Widget {
                id: 4,
                name: "crank".into(),
                grade: "A".into(),
            },
            Widget {
                id: 127,
                name: "flywheel".into(),
                grade: "B+".into(),
            },
        ]);
        state.current_page = 2;
        state.total_pages = 5;

        assert_eq!(
            table(&state),
            "id   Name      Grade\n\
             ---  --------  -----\n\
             4    crank     A\n\
             127  flywheel  B+\n\
             page 2 of 5\n"
        );
    }

    #[test]
    fn empty_listing_says_so() {
        let rendered = table(&state_with(Vec::new()));
        assert!(rendered.contains("(no rows)"));
        assert!(rendered.ends_with("page 1 of 1\n"));
    }

    #[test]
    fn detail_lists_labels_with_values() {
        let widget = Widget {
            id: 9,
            name: "crank".into(),
            grade: "A".into(),
        };
        assert_eq!(detail(&widget), "id     9\nName   crank\nGrade  A\n");
    }
}
