use crate::{
    App, Focus, LOADING_FRAMES,
    accordion::Accordion,
    search::{self, FilteredQuestion, HighlightSpan},
    session::{CatalogStatus, DocumentStatus},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

const SIDEBAR_WIDTH: u16 = 34;

pub(crate) struct UiRenderer<'a> {
    app: &'a mut App,
}

impl<'a> UiRenderer<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn render(&mut self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(frame.area());

        self.render_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(layout[1]);

        self.render_topics(frame, body[0]);

        let questions_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(body[1]);

        self.render_search(frame, questions_area[0]);
        self.render_questions(frame, questions_area[1]);
        self.render_status(frame, layout[2]);

        if self.app.session.is_flashcard_open() {
            self.render_flashcard(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let app = &*self.app;
        let document = app.session.document();
        let header_title = if document.topic.is_empty() {
            Line::from("Q&A Guru").bold().blue().centered()
        } else {
            Line::from(format!("Q&A Guru • {}", document.topic))
                .bold()
                .blue()
                .centered()
        };

        frame.render_widget(
            Paragraph::new(format!("Source: {}", app.catalog_url))
                .block(Block::bordered().title(header_title))
                .centered(),
            area,
        );
    }

    fn render_topics(&self, frame: &mut Frame, area: Rect) {
        let app = &*self.app;
        let block = Self::pane_block("Topics", app.focus == Focus::Topics);
        let catalog = app.session.catalog();

        if catalog.is_empty() {
            let message = match app.session.catalog_status() {
                CatalogStatus::Loading => {
                    format!("{} Loading topics…", LOADING_FRAMES[app.loading_frame])
                }
                CatalogStatus::Ready | CatalogStatus::Unavailable => {
                    "No topics available.".to_string()
                }
            };
            frame.render_widget(
                Paragraph::new(message)
                    .block(block)
                    .wrap(Wrap { trim: false }),
                area,
            );
            return;
        }

        let selected = app.session.selected_location();
        let items: Vec<ListItem> = catalog
            .iter()
            .enumerate()
            .map(|(position, file)| {
                let label = format!("{:02}. {}", position + 1, app.session.title_for(file));
                if selected == Some(file.location.as_str()) {
                    ListItem::new(Line::from(label).bold().cyan())
                } else {
                    ListItem::new(label)
                }
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(app.topic_cursor.min(catalog.len() - 1)));

        frame.render_stateful_widget(
            List::new(items)
                .block(block)
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
            &mut state,
        );
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let app = &*self.app;
        let term = app.session.search_term();
        let filtered_count = app.session.filtered_questions().len();

        let input = if app.search_editing {
            Line::from(vec![Span::raw(term.to_string()), Span::raw("_").slow_blink()])
        } else if term.is_empty() {
            Line::from("Press / to search questions and answers").dark_gray()
        } else {
            Line::from(term.to_string())
        };

        let mut block = Block::bordered().title(Line::from("Search"));
        if !term.is_empty() {
            block = block.title(Line::from(search::result_label(filtered_count)).right_aligned());
        }
        if app.session.accordion().any_open() {
            block = block.title_bottom(Line::from("c: collapse all").right_aligned());
        }
        if app.search_editing {
            block = block.border_style(Style::default().fg(Color::Yellow));
        }

        frame.render_widget(Paragraph::new(input).block(block), area);
    }

    fn render_questions(&self, frame: &mut Frame, area: Rect) {
        let app = &*self.app;
        let block = Self::pane_block("Questions", app.focus == Focus::Questions);
        let term = app.session.search_term();
        let filtered = app.session.filtered_questions();

        if filtered.is_empty() {
            let message = match app.session.document_status() {
                DocumentStatus::Loading => {
                    format!("{} Loading questions…", LOADING_FRAMES[app.loading_frame])
                }
                DocumentStatus::Idle => "Select a topic to see its questions.".to_string(),
                DocumentStatus::Ready | DocumentStatus::Degraded if !term.is_empty() => {
                    format!("No questions match \"{}\".", term)
                }
                DocumentStatus::Ready | DocumentStatus::Degraded => {
                    "This topic has no questions.".to_string()
                }
            };
            frame.render_widget(
                Paragraph::new(message)
                    .block(block)
                    .wrap(Wrap { trim: false }),
                area,
            );
            return;
        }

        let items = Self::question_items(&filtered, app.session.accordion(), term);

        let mut state = ListState::default();
        state.select(Some(app.question_cursor.min(filtered.len() - 1)));

        frame.render_stateful_widget(
            List::new(items)
                .block(block)
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
            &mut state,
        );
    }

    /// Rows are numbered by their position in the filtered list, the same position the
    /// accordion is keyed by.
    fn question_items<'t>(
        filtered: &[FilteredQuestion<'t>],
        accordion: &Accordion,
        term: &str,
    ) -> Vec<ListItem<'t>> {
        filtered
            .iter()
            .enumerate()
            .map(|(row, entry)| {
                let question = entry.question;
                let open = accordion.is_open(row);
                let marker = if open { "–" } else { "+" };

                let mut heading = vec![Span::raw(format!("{} {}. ", marker, row + 1))];
                heading.extend(Self::highlighted_spans(&question.question, term, true));
                let mut lines = vec![Line::from(heading)];

                if open {
                    for answer_line in question.answer.split('\n') {
                        let answer_line = answer_line.trim_end_matches('\r');
                        let mut spans = vec![Span::raw("    ")];
                        spans.extend(Self::highlighted_spans(answer_line, term, false));
                        lines.push(Line::from(spans));
                    }
                    if let Some(example) = question.example_text() {
                        lines.push(Line::from("    Example:").italic().dark_gray());
                        for example_line in example.split('\n') {
                            lines.push(
                                Line::from(format!(
                                    "      {}",
                                    example_line.trim_end_matches('\r')
                                ))
                                .green(),
                            );
                        }
                    }
                }
                ListItem::new(Text::from(lines))
            })
            .collect()
    }

    fn render_flashcard(&self, frame: &mut Frame) {
        let app = &*self.app;
        let area = centered_rect(72, 16, frame.area());
        frame.render_widget(Clear, area);

        let title = Line::from("Random Question").bold().magenta().centered();
        let block = Block::bordered()
            .title(title)
            .title_bottom(
                Line::from("space: reveal • n: next • Esc: close")
                    .dark_gray()
                    .centered(),
            )
            .border_style(Style::default().fg(Color::Magenta));

        let mut lines: Vec<Line> = Vec::new();
        match app.session.flashcard() {
            None => {
                lines.push(Line::from(format!(
                    "{} Gathering questions from every topic…",
                    LOADING_FRAMES[app.loading_frame]
                )));
            }
            Some(card) => {
                let entry = &card.entry;
                if !entry.topic.is_empty() {
                    lines.push(Line::from(entry.topic.clone()).dark_gray().italic());
                    lines.push(Line::default());
                }
                lines.push(Line::from(entry.question.clone()).bold());
                lines.push(Line::default());
                if card.is_sentinel() {
                    lines.push(Line::from("Check the topic source and try again.").dark_gray());
                } else if card.answer_revealed {
                    for answer_line in entry.answer.split('\n') {
                        lines.push(Line::from(answer_line.trim_end_matches('\r').to_string()));
                    }
                    if let Some(example) = entry
                        .example
                        .as_deref()
                        .filter(|example| !example.trim().is_empty())
                    {
                        lines.push(Line::default());
                        for example_line in example.split('\n') {
                            lines.push(
                                Line::from(example_line.trim_end_matches('\r').to_string()).green(),
                            );
                        }
                    }
                } else {
                    lines.push(Line::from("Press space to reveal the answer.").dark_gray());
                }
            }
        }

        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let app = &*self.app;
        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        if let Some(status) = &app.status {
            if app.is_loading() {
                status_lines.push(format!("{} {}", LOADING_FRAMES[app.loading_frame], status));
            } else {
                status_lines.push(status.clone());
            }
        }
        if app.search_editing {
            status_lines.push("Type to filter. Enter or Esc to finish.".to_string());
        } else {
            status_lines.push(
                "Tab: switch pane • ↑/↓ j/k: move • Enter: open • /: search • c: collapse all"
                    .to_string(),
            );
            status_lines.push(
                "r: random question • R: reload topics • Ctrl-r: reset • q/Esc: quit".to_string(),
            );
        }

        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            area,
        );
    }

    fn pane_block(title: &str, focused: bool) -> Block<'static> {
        let block = Block::bordered().title(Line::from(title.to_string()));
        if focused {
            block.border_style(Style::default().fg(Color::Cyan))
        } else {
            block
        }
    }

    fn highlighted_spans<'t>(text: &'t str, term: &str, bold: bool) -> Vec<Span<'t>> {
        search::highlight(text, term)
            .into_iter()
            .map(|HighlightSpan { text, is_match }| {
                let mut style = Style::default();
                if bold {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if is_match {
                    style = style.fg(Color::Black).bg(Color::Cyan);
                }
                Span::styled(text, style)
            })
            .collect()
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
