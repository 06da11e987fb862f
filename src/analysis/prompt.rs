// file: src/analysis/prompt.rs
// description: Prompt construction for comparative company analysis
// reference: https://platform.openai.com/docs/guides/text-generation

use crate::models::CompanyRecord;

pub const SYSTEM_PROMPT: &str = "You are a stock market analysis assistant.";

pub struct AnalysisPrompt<'a> {
    query: &'a str,
    companies: &'a [CompanyRecord],
    reference_exchange: &'a str,
}

impl<'a> AnalysisPrompt<'a> {
    pub fn new(query: &'a str, companies: &'a [CompanyRecord], reference_exchange: &'a str) -> Self {
        Self {
            query,
            companies,
            reference_exchange,
        }
    }

    pub fn company_names(&self) -> String {
        self.companies
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The query is embedded verbatim.
    pub fn render(&self) -> String {
        format!(
            "Based on the user's query: \"{query}\", we have identified the following companies:\n\
             {names}.\n\
             \n\
             For each of these companies, fetch the following metrics:\n\
             - Market Capitalization\n\
             - Revenue Growth\n\
             - Industry Sector\n\
             - Any other key performance indicators (KPIs)\n\
             \n\
             Compare these companies with similar companies listed on the {exchange} in the same sector. Provide:\n\
             1. A business summary for each company.\n\
             2. A comparison of financial metrics with {exchange} benchmarks.\n\
             3. A detailed investment insight and recommendation, highlighting potential opportunities and risks.\n\
             \n\
             Ensure your response is concise and includes relevant data points.",
            query = self.query,
            names = self.company_names(),
            exchange = self.reference_exchange,
        )
    }
}
