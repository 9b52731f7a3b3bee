/// One decoded fragment of a provider response.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_call_index: Option<usize>,
    pub tool_call_id: Option<String>,
    pub tool_call_name: Option<String>,
    pub tool_call_arguments: Option<String>,

    /// The call arrived whole and will receive no further fragments.
    pub tool_call_complete: bool,

    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl Delta {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A tool call fragment. Empty strings are treated as absent.
    pub fn tool_call(
        index: usize,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        let id: String = id.into();
        let name: String = name.into();
        let arguments: String = arguments.into();

        Self {
            tool_call_index: Some(index),
            tool_call_id: (!id.is_empty()).then_some(id),
            tool_call_name: (!name.is_empty()).then_some(name),
            tool_call_arguments: (!arguments.is_empty()).then_some(arguments),
            ..Default::default()
        }
    }

    /// More argument bytes for the call at `index`.
    pub fn arguments(index: usize, arguments: impl Into<String>) -> Self {
        Self::tool_call(index, "", "", arguments)
    }

    #[must_use]
    pub fn complete(mut self) -> Self {
        self.tool_call_complete = true;
        self
    }

    pub fn usage(input_tokens: Option<u64>, output_tokens: Option<u64>) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_usage(mut self, input_tokens: Option<u64>, output_tokens: Option<u64>) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }
}
