//! Fixed instruction templates.

use crate::types::SchemaDescription;

/// Build the SQL generation prompt.
pub fn sql_prompt(schema: &SchemaDescription, question: &str) -> String {
    format!(
        "You are a data analytics assistant. Transform the user's question into a correct SQL query \
         for the freelancer_earnings table. Do not add explanations, only SQL.\n\n\
         {schema}\nQuestion: {question}\nSQL:"
    )
}

/// Build the intent classification prompt.
pub fn intent_prompt(question: &str) -> String {
    format!(
        "\nYou are a data analytics assistant. Determine the intent of the user's question. Possible intents:\n\
         - sql: the question requires an SQL query to the freelancer_earnings table\n\
         - smalltalk: informal question not related to analytics\n\
         - help: request for help using the system\n\
         - unknown: could not determine\n\
         \n\
         Question: {question}\n\
         Intent:\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnInfo;

    #[test]
    fn test_sql_prompt_embeds_schema_and_question() {
        let schema = SchemaDescription {
            table: "freelancer_earnings".to_string(),
            columns: vec![ColumnInfo::new("Earnings_USD", "INTEGER")],
        };

        let prompt = sql_prompt(&schema, "Average earnings?");
        assert!(prompt.starts_with("You are a data analytics assistant. Transform"));
        assert!(prompt.ends_with(
            "Table freelancer_earnings has the following columns:\n- Earnings_USD: INTEGER\nQuestion: Average earnings?\nSQL:"
        ));
    }

    #[test]
    fn test_intent_prompt_lists_every_intent() {
        let prompt = intent_prompt("Hello!");
        for intent in ["- sql:", "- smalltalk:", "- help:", "- unknown:"] {
            assert!(prompt.contains(intent), "missing {intent}");
        }
        assert!(prompt.contains("Question: Hello!\nIntent:"));
    }
}
