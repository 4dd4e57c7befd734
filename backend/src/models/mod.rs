//! Domain records shared by the repository, service and HTTP layers.

pub mod catalog;
pub mod company;
pub mod form;
pub mod ids;
pub mod invitation;
pub mod macros;
pub mod submission;
pub mod user;

pub use catalog::{BinType, BinTypeInput, ContaminationType, ContaminationTypeInput};
pub use company::{non_blank, Company, CompanyInput, CompanyWithStats};
pub use form::{
    BinTallyForm, FormBin, FormBinDetail, FormBinInput, FormBinSpec, FormDetails, FormInput,
    FormSummary, FormUpdate, NewForm, repeated_bin_type, MAX_BIN_QUANTITY, MIN_BIN_QUANTITY,
};
pub use ids::{
    BinTypeId, CompanyId, ContaminationTypeId, FormBinId, FormId, InvitationId, SubmissionId,
    UserId,
};
pub use invitation::{Invitation, InvitationStatus, NewInvitation, INVITATION_VALIDITY_DAYS};
pub use submission::{FormSubmission, NewSubmission, SubmissionRecord};
pub use user::{Actor, NewUser, Role, Scope, User, UserUpdate, UserWithCompany};
