use crate::cli::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Declarative description of a table column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub align: Align,
}

impl TableColumn {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
        }
    }
}

/// Read-only overview rendered as padded columns sized to their widest cell.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<TableColumn>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.rows
            .push(cells.into_iter().map(|cell| cell.into()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Lines without trailing whitespace: header, rule, then one line per row.
    pub fn render_lines(&self) -> Vec<String> {
        let widths = self.widths();
        let format_row = |cells: Vec<&str>| {
            let mut line = String::new();
            for (idx, column) in self.columns.iter().enumerate() {
                if idx > 0 {
                    line.push_str("  ");
                }
                let cell = cells.get(idx).copied().unwrap_or("");
                let width = widths[idx];
                match column.align {
                    Align::Left => line.push_str(&format!("{cell:<width$}")),
                    Align::Right => line.push_str(&format!("{cell:>width$}")),
                }
            }
            line.trim_end().to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(
            self.columns.iter().map(|col| col.header.as_str()).collect(),
        ));
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(total));
        for row in &self.rows {
            lines.push(format_row(row.iter().map(String::as_str).collect()));
        }
        lines
    }

    pub fn print(&self) {
        for line in self.render_lines() {
            output::line(line);
        }
    }
}
