//! Diesel schema for company fields and project projections.

diesel::table! {
    /// Companies with their field-name counter.
    companies (id) {
        /// Company identifier.
        id -> Uuid,
        /// Number of field hashes minted so far.
        field_last_name -> Int8,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Company-wide field definitions.
    company_fields (id) {
        id -> Uuid,
        company_id -> Uuid,
        #[max_length = 20]
        hash -> Varchar,
        #[max_length = 30]
        name -> Varchar,
        description -> Text,
        #[max_length = 50]
        icon -> Varchar,
        /// Numeric data type code.
        data_type -> Int4,
        data_catalog -> Nullable<Uuid>,
        created_by -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Projections of company fields onto projects.
    project_fields (id) {
        id -> Uuid,
        project_id -> Uuid,
        company_id -> Uuid,
        company_field_id -> Uuid,
        required_on_statuses -> Array<Int4>,
        #[max_length = 20]
        style -> Varchar,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(project_fields -> company_fields (company_field_id));
diesel::allow_tables_to_appear_in_same_query!(companies, company_fields, project_fields);
