use crate::contract::model::{SortField, User};
use crate::infra::storage::entity::{Column, Model as UserEntity};

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            surname: entity.surname,
            patronymic: entity.patronymic,
            age: entity.age,
            gender: entity.gender,
            nationality: entity.nationality,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Column backing a public sort field.
pub fn sort_column(field: SortField) -> Column {
    match field {
        SortField::Id => Column::Id,
        SortField::Name => Column::Name,
        SortField::Surname => Column::Surname,
        SortField::Patronymic => Column::Patronymic,
        SortField::Age => Column::Age,
        SortField::Gender => Column::Gender,
        SortField::Nationality => Column::Nationality,
        SortField::CreatedAt => Column::CreatedAt,
        SortField::UpdatedAt => Column::UpdatedAt,
    }
}
