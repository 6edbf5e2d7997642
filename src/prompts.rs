//! 提示词模板

/// 求解题目时使用的系统提示词
pub const QUIZ_SOLVER_SYSTEM_PROMPT: &str = "You are an expert data analyst. You will receive quiz questions that involve:
- Data sourcing (web scraping, API calls, file downloads)
- Data processing (cleaning, transformation, analysis)
- Visualization and narrative answers

Your task is to:
1. Understand the question thoroughly
2. Plan the data steps needed to solve it
3. Produce ONLY the final answer in the requested format

Be precise and accurate. The answer format matters (number, string, boolean, base64, or JSON object).";

/// 抽取题目信息时使用的系统提示词
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You extract structured information from quiz questions. Return valid JSON only.";

/// 抽取题目信息的用户提示词
pub fn extraction_prompt(content: &str) -> String {
    format!(
        r#"From the following quiz question, extract:
1. The question being asked
2. The expected answer type (number, string, boolean, file, or json)
3. Any URLs or data sources mentioned
4. The submission endpoint URL

Quiz content:
{content}

Return as JSON:
{{
    "question": "the main question",
    "answer_type": "number|string|boolean|file|json",
    "data_sources": ["url1", "url2"],
    "submit_url": "submission endpoint"
}}"#
    )
}

/// 生成求解程序的用户提示词
pub fn code_generation_prompt(question: &str) -> String {
    format!(
        r#"Given this quiz question:

{question}

Write a solver program that:
1. Fetches any required data
2. Processes and analyzes it
3. Stores the final answer in the register `answer`

The program is a JSON object {{"steps": [...]}}. Steps run in order. Every step has an
"op" field and writes its result to the register named by "store_to". "source" names a
register to read. In "url" and "template", {{name}} is replaced by the text of a register.
The registers `question` (string) and `data_sources` (array of URLs) are preset.

Available steps:
- {{"op": "set", "value": <any JSON>, "store_to": "r"}}
- {{"op": "fetch", "url": "...", "format": "text|json|base64|data_uri", "store_to": "r"}}
- {{"op": "scrape_text", "url": "...", "store_to": "r"}}
- {{"op": "select_html", "source": "r", "selector": "css", "attr": "optional attribute", "store_to": "r"}}
- {{"op": "parse_json", "source": "r", "store_to": "r"}}
- {{"op": "json_pointer", "source": "r", "pointer": "/a/0/b", "store_to": "r"}}
- {{"op": "regex_match", "source": "r", "pattern": "...", "group": 0, "all": false, "store_to": "r"}}
- {{"op": "parse_csv", "source": "r", "store_to": "r"}}
- {{"op": "filter", "source": "r", "column": "c", "cmp": "eq|ne|gt|ge|lt|le|contains", "value": <any>, "store_to": "r"}}
- {{"op": "aggregate", "source": "r", "column": "optional c", "func": "sum|mean|min|max|count", "store_to": "r"}}
- {{"op": "base64_encode", "source": "r", "store_to": "r"}}
- {{"op": "base64_decode", "source": "r", "store_to": "r"}}
- {{"op": "format", "template": "text with {{r}}", "store_to": "r"}}

Return ONLY the JSON program, no explanations."#
    )
}

/// 直接问答兜底的用户提示词
pub fn direct_answer_prompt(question: &str) -> String {
    format!("Answer this question directly, return only the answer:\n{question}")
}
