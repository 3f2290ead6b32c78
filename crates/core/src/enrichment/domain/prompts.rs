use crate::identity::domain::description::ConsolidatedDescription;

const SCHEMA: &str = r#"{
  "gender": "male | female | unknown",
  "age": "child | teen | young_adult | adult | senior | unknown",
  "upper_clothing": "short description (e.g. 'black hoodie'), at most 25 characters",
  "lower_clothing": "short description (e.g. 'blue jeans'), at most 25 characters",
  "head_accessory": "none | beard | mustache | tattoos | beanie | cap | hood | hat | glasses | sunglasses | other"
}"#;

const RULES: &str = "Strict rules:
1. Return EVERY field. If a field cannot be determined use \"unknown\" for gender, age and clothing and \"none\" for head_accessory.
2. Clothing descriptions are at most 25 characters; shorten longer ones keeping the key words.
3. Use ONLY the listed values for gender, age and head_accessory. If nothing fits use \"unknown\" or \"other\".
4. Do not repeat keys, add fields, explain anything or use markdown.
5. Return only valid JSON, ready to parse.";

/// Prompt for the first sample of a person.
pub fn instruction() -> String {
    format!(
        "Analyze the image of a person and return ONLY valid JSON in this format:\n\n{SCHEMA}\n\n{RULES}"
    )
}

/// Prompt for later samples: asks the model to confirm or correct the
/// description gathered so far.
pub fn refinement(previous: &ConsolidatedDescription) -> String {
    let previous_json =
        serde_json::to_string_pretty(&previous.to_value()).unwrap_or_else(|_| "{}".to_string());
    format!(
        "This is another image of the same person. The description so far is:\n\n{previous_json}\n\n\
         Keep the values this image confirms, correct the ones it clearly contradicts and fill in \
         any \"unknown\" value it reveals. Return ONLY valid JSON in this format:\n\n{SCHEMA}\n\n{RULES}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::description::Gender;

    #[test]
    fn test_instruction_lists_every_field() {
        let prompt = instruction();
        for field in ["gender", "age", "upper_clothing", "lower_clothing", "head_accessory"] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_refinement_embeds_previous_result() {
        let previous = ConsolidatedDescription {
            gender: Gender::Female,
            upper_clothing: "green parka".into(),
            ..Default::default()
        };
        let prompt = refinement(&previous);
        assert!(prompt.contains("\"female\""));
        assert!(prompt.contains("green parka"));
        assert!(prompt.contains("head_accessory"));
    }
}
