// Mirrors migrations/0001_hospital_schema.sql.

diesel::table! {
    admission (admission_id) {
        admission_id -> Integer,
        admission_fee -> Double,
        admission_date -> Date,
        discharge_date -> Nullable<Date>,
    }
}

diesel::table! {
    allocated (admission_id) {
        admission_id -> Integer,
        room_id -> Text,
        days_count -> Integer,
    }
}

diesel::table! {
    assigned_to (admission_id) {
        admission_id -> Integer,
        patient_id -> Integer,
        doctor_id -> Nullable<Integer>,
        nurse_id -> Nullable<Integer>,
    }
}

diesel::table! {
    bill (bill_id) {
        bill_id -> Integer,
        patient_id -> Integer,
        bill_date -> Date,
        other_charges -> Double,
        medicine_cost -> Double,
        room_cost -> Double,
        doctor_cost -> Double,
    }
}

diesel::table! {
    consults (treatment_id) {
        treatment_id -> Integer,
        doctor_id -> Integer,
    }
}

diesel::table! {
    doctor (doctor_id) {
        doctor_id -> Integer,
        qualification -> Nullable<Text>,
        specialty -> Nullable<Text>,
        visit_fee -> Double,
    }
}

diesel::table! {
    employee (eid) {
        eid -> Integer,
        etype -> Text,
        name -> Text,
        birthdate -> Nullable<Date>,
        salary -> Nullable<Double>,
        email -> Nullable<Text>,
        address -> Nullable<Text>,
    }
}

diesel::table! {
    had (id) {
        id -> Integer,
        treatment_id -> Integer,
        test_id -> Integer,
    }
}

diesel::table! {
    lab_test (test_id) {
        test_id -> Integer,
        test_name -> Text,
        test_cost -> Double,
    }
}

diesel::table! {
    medicine (medicine_id) {
        medicine_id -> Integer,
        medicine_name -> Text,
        medicine_cost -> Double,
    }
}

diesel::table! {
    nurse (nurse_id) {
        nurse_id -> Integer,
        patient_count -> Integer,
    }
}

diesel::table! {
    patient (pid) {
        pid -> Integer,
        name -> Text,
        gender -> Nullable<Text>,
        birthdate -> Nullable<Date>,
        relative_num -> Nullable<Text>,
        address -> Nullable<Text>,
    }
}

diesel::table! {
    patient_phone (patient_id, phone_number) {
        patient_id -> Integer,
        phone_number -> Text,
    }
}

diesel::table! {
    room (room_id) {
        room_id -> Text,
        room_type -> Text,
        room_cost -> Double,
    }
}

diesel::table! {
    takes (patient_id, treatment_id) {
        patient_id -> Integer,
        treatment_id -> Integer,
    }
}

diesel::table! {
    takes_medicine (id) {
        id -> Integer,
        treatment_id -> Integer,
        medicine_id -> Integer,
    }
}

diesel::table! {
    treatment (tid) {
        tid -> Integer,
        description -> Nullable<Text>,
        treatment_date -> Date,
    }
}

diesel::joinable!(allocated -> admission (admission_id));
diesel::joinable!(allocated -> room (room_id));
diesel::joinable!(assigned_to -> admission (admission_id));
diesel::joinable!(assigned_to -> patient (patient_id));
diesel::joinable!(bill -> patient (patient_id));
diesel::joinable!(consults -> employee (doctor_id));
diesel::joinable!(consults -> treatment (treatment_id));
diesel::joinable!(doctor -> employee (doctor_id));
diesel::joinable!(had -> lab_test (test_id));
diesel::joinable!(had -> treatment (treatment_id));
diesel::joinable!(nurse -> employee (nurse_id));
diesel::joinable!(patient_phone -> patient (patient_id));
diesel::joinable!(takes -> patient (patient_id));
diesel::joinable!(takes -> treatment (treatment_id));
diesel::joinable!(takes_medicine -> medicine (medicine_id));
diesel::joinable!(takes_medicine -> treatment (treatment_id));

diesel::allow_tables_to_appear_in_same_query!(
    admission,
    allocated,
    assigned_to,
    bill,
    consults,
    doctor,
    employee,
    had,
    lab_test,
    medicine,
    nurse,
    patient,
    patient_phone,
    room,
    takes,
    takes_medicine,
    treatment,
);
