//! The create-contract action
//!
//! Store and org ids are not parameters. They come from the authenticated
//! caller, never from model output.

use super::schema::{ActionSchema, ArgValue, Arguments, ParamSpec, ParamType, ValidationError};
use crate::store::ContractTerms;

/// Name under which the model sees the action
pub const CREATE_CONTRACT: &str = "add_contract_tool";

/// Status recorded when the conversation never mentions one
pub const DEFAULT_STATUS: &str = "active";

pub fn create_contract_schema() -> ActionSchema {
    use ParamType::{Boolean, Float, Integer, StringList};
    let text = ParamType::String;

    ActionSchema {
        name: CREATE_CONTRACT,
        description: "Adds a vendor contract to the contract store. Call this only once every \
                      required field has been provided by the user.",
        params: vec![
            ParamSpec::required("vendor_name", text, "Legal or trading name of the vendor"),
            ParamSpec::required("vendor_email", text, "Vendor contact email address"),
            ParamSpec::required("phone", text, "Vendor contact phone number"),
            ParamSpec::required("address", text, "Vendor postal address"),
            ParamSpec::required("pincode", text, "Postal code of the vendor address"),
            ParamSpec::required("business_type", text, "Kind of business, e.g. manufacturer"),
            ParamSpec::required("gst_number", text, "Vendor GST (tax registration) number"),
            ParamSpec::required("tax", Float, "Tax rate in percent"),
            ParamSpec::required("product_name", text, "Product covered by the contract"),
            ParamSpec::required("quantity", Integer, "Quantity of the product"),
            ParamSpec::required("unit", text, "Unit of measure for the quantity"),
            ParamSpec::required("category", text, "Product category"),
            ParamSpec::required("sub_category", text, "Product sub-category"),
            ParamSpec::required("tags", StringList, "List of tags related to the product"),
            ParamSpec::required("warranty_tenure", Integer, "Length of the warranty"),
            ParamSpec::required("warranty_unit", text, "Unit of the warranty tenure, e.g. months"),
            ParamSpec::required("date_of_delivery", text, "Delivery date (YYYY-MM-DD)"),
            ParamSpec::required("returnable", Boolean, "Whether the product can be returned"),
            ParamSpec::required(
                "return_conditions",
                StringList,
                "List of return conditions like accepted, unused",
            ),
            ParamSpec::required("status", text, "Contract status")
                .with_default(ArgValue::String(DEFAULT_STATUS.to_string())),
        ],
    }
}

impl TryFrom<&Arguments> for ContractTerms {
    type Error = ValidationError;

    fn try_from(args: &Arguments) -> Result<Self, Self::Error> {
        Ok(ContractTerms {
            vendor_name: args.string("vendor_name")?,
            vendor_email: args.string("vendor_email")?,
            phone: args.string("phone")?,
            address: args.string("address")?,
            pincode: args.string("pincode")?,
            business_type: args.string("business_type")?,
            gst_number: args.string("gst_number")?,
            tax: args.float("tax")?,
            product_name: args.string("product_name")?,
            quantity: args.integer("quantity")?,
            unit: args.string("unit")?,
            category: args.string("category")?,
            sub_category: args.string("sub_category")?,
            tags: args.string_list("tags")?,
            warranty_tenure: args.integer("warranty_tenure")?,
            warranty_unit: args.string("warranty_unit")?,
            date_of_delivery: args.string("date_of_delivery")?,
            returnable: args.boolean("returnable")?,
            return_conditions: args.string_list("return_conditions")?,
            status: args.string("status")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::contract_arguments;
    use serde_json::json;

    #[test]
    fn test_complete_arguments_build_terms() {
        let args = create_contract_schema()
            .validate(&contract_arguments())
            .unwrap();
        let terms = ContractTerms::try_from(&args).unwrap();

        assert_eq!(terms.vendor_name, "Acme Supplies");
        assert_eq!(terms.quantity, 500);
        assert_eq!(terms.tags, vec!["bulk", "hardware"]);
        assert!(terms.returnable);
    }

    #[test]
    fn test_status_defaults_when_absent() {
        let mut raw = contract_arguments();
        raw.as_object_mut().unwrap().remove("status");

        let args = create_contract_schema().validate(&raw).unwrap();
        let terms = ContractTerms::try_from(&args).unwrap();
        assert_eq!(terms.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_model_cannot_supply_provenance() {
        let schema = create_contract_schema();
        assert!(schema.params.iter().all(|p| p.name != "store_id" && p.name != "org_id"));

        let mut raw = contract_arguments();
        raw["store_id"] = json!("ST-OTHER");
        let args = schema.validate(&raw).unwrap();
        assert!(args.get("store_id").is_none());
    }

    #[test]
    fn test_schema_requires_nineteen_fields() {
        let schema = create_contract_schema().to_json_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 19);
    }
}
