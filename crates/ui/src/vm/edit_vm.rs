use services::EditSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOptionVm {
    pub label: String,
    pub text: String,
    pub pending: bool,
    pub canonical: bool,
}

/// One question of the answer-key editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditVm {
    pub title: String,
    pub position: String,
    pub question: String,
    pub options: Vec<EditOptionVm>,
    pub at_end: bool,
}

impl EditVm {
    #[must_use]
    pub fn new(title: &str, session: &EditSession, at_end: bool) -> Self {
        let cursor = session.cursor();
        let question = session.current();
        let options = question
            .labeled_options()
            .map(|(label, text)| EditOptionVm {
                label,
                text: text.to_owned(),
                pending: session.pending() == Some(text),
                canonical: question.answer() == Some(text),
            })
            .collect();
        Self {
            title: title.to_owned(),
            position: format!("Question {} of {}", cursor.index() + 1, cursor.len()),
            question: question.text().to_owned(),
            options,
            at_end,
        }
    }
}
